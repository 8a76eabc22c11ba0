use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;

/// Immutable configuration for one sort run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SorterConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub temp_directory: PathBuf,
    pub chunk_base_name: String,
    pub max_lines_per_chunk: usize,
    pub pool_size: usize,
    pub io_buffer_size_kb: usize,
    pub verbose: bool,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("output/unsorted.txt"),
            output_path: PathBuf::from("output/unsorted.txt.sorted"),
            temp_directory: PathBuf::from(TEMP_DIR_NAME),
            chunk_base_name: CHUNK_FILE_PREFIX.to_string(),
            max_lines_per_chunk: DEFAULT_MAX_LINES_PER_CHUNK,
            pool_size: DEFAULT_POOL_SIZE,
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            verbose: false,
        }
    }
}

impl SorterConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_lines_per_chunk < MIN_LINES_PER_CHUNK
            || self.max_lines_per_chunk > MAX_LINES_PER_CHUNK
        {
            return Err(anyhow::anyhow!(
                "Lines per chunk must be between {} and {}",
                MIN_LINES_PER_CHUNK,
                MAX_LINES_PER_CHUNK
            ));
        }

        if self.pool_size < MIN_POOL_SIZE || self.pool_size > MAX_POOL_SIZE {
            return Err(anyhow::anyhow!(
                "Pool size must be between {} and {}",
                MIN_POOL_SIZE,
                MAX_POOL_SIZE
            ));
        }

        if self.io_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB
        {
            return Err(anyhow::anyhow!(
                "I/O buffer size must be between {} and {} KB",
                MIN_IO_BUFFER_SIZE_KB,
                MAX_IO_BUFFER_SIZE_KB
            ));
        }

        if self.chunk_base_name.is_empty() {
            return Err(anyhow::anyhow!("Chunk base name must not be empty"));
        }

        Ok(())
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }
}
