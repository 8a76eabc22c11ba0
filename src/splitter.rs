//! Input splitting: the first pipeline stage.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use async_channel::Sender;

use crate::chunk::{ChunkHandle, ChunkStore};
use crate::comparator;
use crate::constants::SHUTDOWN_CHECK_INTERVAL_LINES;

/// What the splitter saw on its single pass over the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOutcome {
    pub records: usize,
    pub chunks: usize,
}

/// Streams the input once, partitioning its non-blank lines into chunks of
/// at most `max_lines_per_chunk` records.
pub struct Splitter {
    input_path: PathBuf,
    max_lines_per_chunk: usize,
    io_buffer_size: usize,
}

impl Splitter {
    pub fn new(input_path: PathBuf, max_lines_per_chunk: usize, io_buffer_size: usize) -> Self {
        Self {
            input_path,
            max_lines_per_chunk,
            io_buffer_size,
        }
    }

    /// Runs start to finish, publishing every chunk handle into the
    /// unsorted channel. The caller closes the channel afterwards; that
    /// close is the "splitting done" signal the sort pool drains against.
    ///
    /// Blank lines are dropped and do not count toward chunk boundaries.
    /// A line without the `.` key separator fails the run with its
    /// position; silently missorting it is not an option.
    pub fn run(
        &self,
        store: &ChunkStore,
        unsorted: &Sender<ChunkHandle>,
        shutdown: &AtomicBool,
    ) -> Result<SplitOutcome> {
        let file = File::open(&self.input_path)
            .with_context(|| format!("failed to open input {}", self.input_path.display()))?;
        let reader = BufReader::with_capacity(self.io_buffer_size, file);

        let mut buffer: Vec<String> = Vec::with_capacity(self.max_lines_per_chunk);
        let mut outcome = SplitOutcome::default();

        for (index, line) in reader.lines().enumerate() {
            let mut line = line.with_context(|| {
                format!("failed to read input {}", self.input_path.display())
            })?;

            if line.ends_with('\r') {
                line.pop();
            }
            if line.is_empty() {
                continue;
            }
            if !comparator::is_valid_record(&line) {
                bail!(
                    "malformed record at line {}: missing `.` key separator in {:?}",
                    index + 1,
                    line
                );
            }

            buffer.push(line);
            outcome.records += 1;

            if buffer.len() == self.max_lines_per_chunk {
                self.flush_chunk(store, unsorted, &mut buffer, &mut outcome)?;
            }
            if outcome.records % SHUTDOWN_CHECK_INTERVAL_LINES == 0
                && shutdown.load(Ordering::Relaxed)
            {
                bail!("splitting interrupted by shutdown signal");
            }
        }

        // Remainder below the chunk threshold still becomes one chunk.
        if !buffer.is_empty() {
            self.flush_chunk(store, unsorted, &mut buffer, &mut outcome)?;
        }

        Ok(outcome)
    }

    fn flush_chunk(
        &self,
        store: &ChunkStore,
        unsorted: &Sender<ChunkHandle>,
        buffer: &mut Vec<String>,
        outcome: &mut SplitOutcome,
    ) -> Result<()> {
        let handle = store.create(outcome.chunks, buffer)?;
        outcome.chunks += 1;
        buffer.clear();

        // The channel is unbounded, so this never waits on consumers; it
        // only fails when every sort worker is already gone.
        if unsorted.try_send(handle).is_err() {
            bail!("unsorted queue closed before splitting finished");
        }
        Ok(())
    }
}
