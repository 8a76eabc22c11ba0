//! Synthetic input generation.
//!
//! Produces an unsorted file of random records in the sorter's line
//! format, `<digit>.<word>[ <word>]`, drawn from an embedded word list.
//! Only used to build realistic inputs; the sorter itself never depends
//! on how its input was produced.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;

use crate::constants::*;

static WORD_LIST: &str = include_str!("../assets/words.txt");

pub struct FileGenerator {
    output_path: PathBuf,
    size_mb: usize,
}

impl FileGenerator {
    pub fn new(output_path: impl Into<PathBuf>, size_mb: usize) -> Self {
        Self {
            output_path: output_path.into(),
            size_mb,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Writes random records until the file reaches the requested size.
    ///
    /// Returns `Ok(false)` without touching disk when the size is zero or
    /// the target already exists; an existing file is never overwritten.
    pub fn generate(&self) -> Result<bool> {
        if self.size_mb == 0 || self.output_path.exists() {
            return Ok(false);
        }

        let words: Vec<&str> = WORD_LIST.lines().filter(|word| !word.is_empty()).collect();
        let size_limit = (self.size_mb * BYTES_PER_MB) as u64;

        let file = File::create(&self.output_path).with_context(|| {
            format!("failed to create test file {}", self.output_path.display())
        })?;
        let mut writer = BufWriter::new(file);
        let mut rng = rand::thread_rng();
        let mut written: u64 = 0;

        while written < size_limit {
            let digit = rng.gen_range(1..GENERATOR_MAX_KEY);
            let word = words[rng.gen_range(0..words.len())];

            let line = if rng.gen_bool(GENERATOR_SECOND_WORD_PROBABILITY) {
                let second = words[rng.gen_range(0..words.len())];
                format!("{}{}{} {}", digit, KEY_SEPARATOR, word, second)
            } else {
                format!("{}{}{}", digit, KEY_SEPARATOR, word)
            };

            written += line.len() as u64 + 1;
            writeln!(writer, "{}", line)?;
        }

        writer.flush()?;
        Ok(true)
    }
}
