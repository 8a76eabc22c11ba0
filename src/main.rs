use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use hugesort::constants::DEFAULT_FILE_SIZE_MB;
use hugesort::{FileGenerator, SortProcessor, SorterConfig};

#[derive(Parser)]
#[command(name = "hugesort")]
#[command(about = "Concurrent external merge sort for huge line-oriented text files")]
#[command(version)]
struct Args {
    #[arg(short, long, help = "File to sort")]
    input: Option<PathBuf>,

    #[arg(short, long, help = "Destination for the sorted file (default: <input>.sorted)")]
    output: Option<PathBuf>,

    #[arg(short, long, default_value = "hugesort_config.json", help = "Configuration file")]
    config: PathBuf,

    #[arg(long, help = "Generate a fresh random input file before sorting")]
    create_new: bool,

    #[arg(long, help = "Size of the generated input in megabytes")]
    file_size_mb: Option<usize>,

    #[arg(long, help = "Maximum records per chunk")]
    lines_per_chunk: Option<usize>,

    #[arg(long, help = "Workers in each of the sort and merge pools")]
    pool_size: Option<usize>,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        SorterConfig::from_file(&args.config)?
    } else {
        println!(
            "Config file not found, creating default: {}",
            args.config.display()
        );
        let default_config = SorterConfig::default();
        default_config.to_file(&args.config)?;
        default_config
    };

    if let Some(input) = args.input {
        config.output_path = match &args.output {
            Some(output) => output.clone(),
            None => {
                let mut sorted = input.clone().into_os_string();
                sorted.push(".sorted");
                PathBuf::from(sorted)
            }
        };
        config.input_path = input;
    } else if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(lines_per_chunk) = args.lines_per_chunk {
        config.max_lines_per_chunk = lines_per_chunk;
    }
    if let Some(pool_size) = args.pool_size {
        config.pool_size = pool_size;
    }
    if args.verbose {
        config.verbose = true;
    }

    if args.create_new {
        let size_mb = args.file_size_mb.unwrap_or(DEFAULT_FILE_SIZE_MB);
        if let Some(parent) = config.input_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if config.input_path.exists() {
            std::fs::remove_file(&config.input_path)?;
        }

        println!("Creating unsorted file ({} MB)...", size_mb);
        let generator = FileGenerator::new(&config.input_path, size_mb);
        if generator.generate()? {
            println!("File created: {}", config.input_path.display());
        }
    }

    println!(
        "hugesort | chunks: {} lines, pool: {} workers",
        config.max_lines_per_chunk, config.pool_size
    );

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nShutdown signal received. Gracefully stopping...");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    let output_path = config.output_path.clone();
    let start_time = Instant::now();

    let processor = SortProcessor::new(config)?.with_shutdown_signal(shutdown_flag);
    let stats = processor.run().await?;

    println!("Sort complete: {}", output_path.display());
    println!("  Records: {}", stats.records_sorted);
    println!(
        "  Chunks: {} split, {} merges",
        stats.chunks_created, stats.merges_completed
    );
    println!("  Memory: {:.1} MB", stats.process_memory_mb);
    println!("  Elapsed: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
