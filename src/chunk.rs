//! Durable chunk storage.
//!
//! A chunk is one addressable batch of records persisted as a file under
//! the run's temp directory. Handles move between pipeline stages through
//! the work queues, and a handle is owned by exactly one component at a
//! time, so chunk files are never touched concurrently.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::*;

/// Addressable reference to one durable chunk.
#[derive(Debug)]
pub struct ChunkHandle {
    path: PathBuf,
    /// Approximate record count, carried for capacity hints and reporting.
    records: usize,
}

impl ChunkHandle {
    pub(crate) fn new(path: PathBuf, records: usize) -> Self {
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> usize {
        self.records
    }
}

/// Creates, reads, rewrites and retires chunk files.
pub struct ChunkStore {
    temp_directory: PathBuf,
    chunk_base_name: String,
    io_buffer_size: usize,
    /// Source of unique merge-chunk names. Concurrent merge workers each
    /// reserve a token with a single atomic increment, so two results can
    /// never collide on a path.
    merge_token: AtomicU64,
}

impl ChunkStore {
    pub fn new(temp_directory: PathBuf, chunk_base_name: String, io_buffer_size: usize) -> Self {
        Self {
            temp_directory,
            chunk_base_name,
            io_buffer_size,
            merge_token: AtomicU64::new(0),
        }
    }

    /// Persists a split chunk under its monotonic index.
    pub fn create(&self, index: usize, records: &[String]) -> Result<ChunkHandle> {
        let path = self.temp_directory.join(format!(
            "{}{}{}",
            self.chunk_base_name, index, CHUNK_FILE_EXTENSION
        ));
        self.write_records(&path, records)?;
        Ok(ChunkHandle::new(path, records.len()))
    }

    /// Reserves a uniquely named destination for a merge result.
    pub fn merge_target(&self) -> PathBuf {
        let token = self.merge_token.fetch_add(1, Ordering::Relaxed);
        self.temp_directory.join(format!(
            "{}{}{}",
            MERGE_FILE_PREFIX, token, CHUNK_FILE_EXTENSION
        ))
    }

    pub fn read(&self, handle: &ChunkHandle) -> Result<Vec<String>> {
        let file = File::open(handle.path())
            .with_context(|| format!("failed to open chunk {}", handle.path().display()))?;
        let reader = BufReader::with_capacity(self.io_buffer_size, file);

        let mut records = Vec::with_capacity(handle.records());
        for line in reader.lines() {
            let line = line
                .with_context(|| format!("failed to read chunk {}", handle.path().display()))?;
            if !line.is_empty() {
                records.push(line);
            }
        }
        Ok(records)
    }

    /// Rewrites a chunk in place, e.g. after its records were reordered.
    pub fn write(&self, handle: &ChunkHandle, records: &[String]) -> Result<()> {
        self.write_records(handle.path(), records)
    }

    pub fn open_reader(&self, handle: &ChunkHandle) -> Result<BufReader<File>> {
        let file = File::open(handle.path())
            .with_context(|| format!("failed to open chunk {}", handle.path().display()))?;
        Ok(BufReader::with_capacity(self.io_buffer_size, file))
    }

    pub fn open_writer(&self, path: &Path) -> Result<BufWriter<File>> {
        let file = File::create(path)
            .with_context(|| format!("failed to create chunk {}", path.display()))?;
        Ok(BufWriter::with_capacity(self.io_buffer_size, file))
    }

    /// Removes a consumed chunk from disk.
    pub fn delete(&self, handle: ChunkHandle) -> Result<()> {
        fs::remove_file(handle.path())
            .with_context(|| format!("failed to delete chunk {}", handle.path().display()))
    }

    /// Moves the terminal chunk to its final location. Rename is atomic on
    /// a single filesystem; when the output lives on another one, fall back
    /// to copy-and-remove.
    pub fn finalize(&self, handle: ChunkHandle, output_path: &Path) -> Result<()> {
        if fs::rename(handle.path(), output_path).is_err() {
            fs::copy(handle.path(), output_path).with_context(|| {
                format!(
                    "failed to move chunk {} to {}",
                    handle.path().display(),
                    output_path.display()
                )
            })?;
            fs::remove_file(handle.path()).with_context(|| {
                format!("failed to remove finalized chunk {}", handle.path().display())
            })?;
        }
        Ok(())
    }

    fn write_records(&self, path: &Path, records: &[String]) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create chunk {}", path.display()))?;
        let mut writer = BufWriter::with_capacity(self.io_buffer_size, file);

        for record in records {
            writeln!(writer, "{}", record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
