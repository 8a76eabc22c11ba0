use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use hugesort::{comparator, sort_file, FileGenerator, SortProcessor, SorterConfig};

/// Helper to write an input file from a list of lines.
fn write_input(dir: &TempDir, name: &str, lines: &[&str]) -> Result<PathBuf> {
    let path = dir.path().join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&path, content)?;
    Ok(path)
}

/// Helper to build a run configuration confined to the test directory.
fn test_config(dir: &TempDir, input: &Path) -> SorterConfig {
    let mut config = SorterConfig::default();
    config.input_path = input.to_path_buf();
    config.output_path = dir.path().join("sorted.txt");
    config.temp_directory = dir.path().join("sortchunks");
    config.max_lines_per_chunk = 2;
    config.pool_size = 2;
    config
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(String::from)
        .collect())
}

fn assert_in_comparator_order(lines: &[String]) {
    for pair in lines.windows(2) {
        assert_ne!(
            comparator::compare(&pair[0], &pair[1]),
            Ordering::Greater,
            "output out of order: {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sorts_the_reference_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(
        &dir,
        "input.txt",
        &[
            "415.Apple",
            "2.Banana is yellow",
            "32.Cherry is the best",
            "1.Apple",
        ],
    )?;

    let config = test_config(&dir, &input);
    let output = config.output_path.clone();
    let stats = sort_file(config).await?;

    assert_eq!(
        read_lines(&output)?,
        vec![
            "1.Apple",
            "415.Apple",
            "2.Banana is yellow",
            "32.Cherry is the best",
        ]
    );
    assert_eq!(stats.records_sorted, 4);
    assert_eq!(stats.chunks_created, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn output_is_an_ordered_permutation_of_generated_input() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("unsorted.txt");
    assert!(FileGenerator::new(&input, 1).generate()?);

    let mut config = test_config(&dir, &input);
    config.max_lines_per_chunk = 1000;
    config.pool_size = 4;
    let output = config.output_path.clone();
    let stats = sort_file(config).await?;

    let input_lines: Vec<String> = read_lines(&input)?
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect();
    let output_lines = read_lines(&output)?;

    assert_eq!(stats.records_sorted, input_lines.len());
    assert_eq!(output_lines.len(), input_lines.len());

    // Same multiset of lines: nothing lost, duplicated or fabricated.
    let mut expected = input_lines;
    expected.sort();
    let mut actual = output_lines.clone();
    actual.sort();
    assert_eq!(actual, expected);

    assert_in_comparator_order(&output_lines);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sorting_an_already_sorted_file_reproduces_it() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(
        &dir,
        "input.txt",
        &["3.apple", "1.cherry", "2.cherry", "9.plum"],
    )?;

    let first_config = test_config(&dir, &input);
    let first_output = first_config.output_path.clone();
    sort_file(first_config).await?;

    let mut second_config = test_config(&dir, &first_output);
    second_config.output_path = dir.path().join("sorted_again.txt");
    second_config.temp_directory = dir.path().join("sortchunks2");
    let second_output = second_config.output_path.clone();
    sort_file(second_config).await?;

    assert_eq!(fs::read(&first_output)?, fs::read(&second_output)?);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn output_is_independent_of_chunking_and_pool_size() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("unsorted.txt");
    assert!(FileGenerator::new(&input, 1).generate()?);

    let mut outputs = Vec::new();
    for (index, (lines_per_chunk, pool_size)) in
        [(50, 1), (997, 4), (100_000, 2)].iter().enumerate()
    {
        let mut config = test_config(&dir, &input);
        config.max_lines_per_chunk = *lines_per_chunk;
        config.pool_size = *pool_size;
        config.output_path = dir.path().join(format!("sorted_{}.txt", index));
        config.temp_directory = dir.path().join(format!("sortchunks_{}", index));

        let output = config.output_path.clone();
        sort_file(config).await?;
        outputs.push(fs::read(&output)?);
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blank_lines_never_reach_the_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(
        &dir,
        "input.txt",
        &["", "2.banana", "", "", "1.apple", "3.cherry", ""],
    )?;

    let config = test_config(&dir, &input);
    let output = config.output_path.clone();
    let stats = sort_file(config).await?;

    let output_lines = read_lines(&output)?;
    assert_eq!(output_lines, vec!["1.apple", "2.banana", "3.cherry"]);
    assert!(output_lines.iter().all(|line| !line.is_empty()));
    assert_eq!(stats.records_sorted, 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missing_input_fails_without_creating_output() -> Result<()> {
    let dir = TempDir::new()?;
    let config = test_config(&dir, &dir.path().join("does_not_exist.txt"));
    let output = config.output_path.clone();
    let temp = config.temp_directory.clone();

    let processor = SortProcessor::new(config)?;
    assert!(processor.run().await.is_err());

    assert!(!output.exists());
    assert!(!temp.exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_input_produces_an_empty_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("input.txt");
    fs::write(&input, "")?;

    let config = test_config(&dir, &input);
    let output = config.output_path.clone();
    let stats = sort_file(config).await?;

    assert!(output.exists());
    assert_eq!(fs::read_to_string(&output)?, "");
    assert_eq!(stats.records_sorted, 0);
    assert_eq!(stats.chunks_created, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn malformed_records_abort_the_run() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(&dir, "input.txt", &["1.fine", "no separator here"])?;

    let config = test_config(&dir, &input);
    let output = config.output_path.clone();

    let error = sort_file(config).await.unwrap_err();
    assert!(error.to_string().contains("line 2"), "got: {}", error);
    assert!(!output.exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn temp_directory_is_consumed_by_a_successful_run() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(
        &dir,
        "input.txt",
        &["5.e", "4.d", "3.c", "2.b", "1.a", "6.f", "7.g"],
    )?;

    let config = test_config(&dir, &input);
    let temp = config.temp_directory.clone();
    let output = config.output_path.clone();
    sort_file(config).await?;

    assert!(output.exists());
    assert!(!temp.exists(), "temp directory should be fully consumed");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_stale_output_file_is_replaced() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_input(&dir, "input.txt", &["2.banana", "1.apple"])?;

    let config = test_config(&dir, &input);
    let output = config.output_path.clone();
    fs::write(&output, "stale content from an earlier run\n")?;

    sort_file(config).await?;
    assert_eq!(read_lines(&output)?, vec!["1.apple", "2.banana"]);
    Ok(())
}
