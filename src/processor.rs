//! Pipeline orchestration.
//!
//! One run wires the stages together: a single splitter task feeds the
//! unsorted channel, a pool of sort workers drains it into the merge
//! queue, and a pool of merge workers reduces that queue pairwise until a
//! single chunk survives. All stages run concurrently; the processor
//! awaits them in pipeline order and performs the terminal reduction
//! itself, single-threaded, once the merge pool has provably exited.

use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use async_channel::{Receiver, Sender};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::chunk::{ChunkHandle, ChunkStore};
use crate::config::SorterConfig;
use crate::constants::*;
use crate::memsort;
use crate::merger;
use crate::queue::MergeQueue;
use crate::splitter::{SplitOutcome, Splitter};
use crate::SortStats;

pub struct SortProcessor {
    config: SorterConfig,
    shutdown_flag: Arc<AtomicBool>,
}

impl SortProcessor {
    pub fn new(config: SorterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Installs an external shutdown signal. When it flips, every stage
    /// stops pulling new work and the run fails as interrupted; whatever
    /// is left in the temp directory is wiped by the next run.
    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = shutdown_flag;
        self
    }

    pub async fn run(&self) -> Result<SortStats> {
        let start_time = Instant::now();

        // Preconditions come before any side effect on disk.
        if self.config.input_path.as_os_str().is_empty()
            || self.config.output_path.as_os_str().is_empty()
        {
            bail!("input and output paths must both be configured");
        }
        if !self.config.input_path.is_file() {
            bail!(
                "input file does not exist: {}",
                self.config.input_path.display()
            );
        }

        self.prepare_workspace()?;

        if self.config.verbose {
            println!(
                "Sorting {} | chunks of {} lines, {} workers per pool",
                self.config.input_path.display(),
                self.config.max_lines_per_chunk,
                self.config.pool_size
            );
        }

        let store = Arc::new(ChunkStore::new(
            self.config.temp_directory.clone(),
            self.config.chunk_base_name.clone(),
            self.config.io_buffer_size_bytes(),
        ));
        let unmerged = Arc::new(MergeQueue::new());
        let (unsorted_tx, unsorted_rx) = async_channel::unbounded::<ChunkHandle>();
        let merges_completed = Arc::new(AtomicUsize::new(0));

        // Every stage is spawned before any is awaited.
        let monitor = self.spawn_monitor(unsorted_rx.clone(), Arc::clone(&unmerged));
        let splitter_task = self.spawn_splitter(Arc::clone(&store), unsorted_tx);
        let mut sort_pool = self.spawn_sort_pool(&store, &unsorted_rx, &unmerged);
        let mut merge_pool = self.spawn_merge_pool(&store, &unmerged, &merges_completed);

        let mut first_error: Option<anyhow::Error> = None;
        let mut outcome = SplitOutcome::default();

        match splitter_task.await {
            Ok(Ok(result)) => outcome = result,
            Ok(Err(err)) => first_error = Some(err),
            Err(err) => first_error = Some(anyhow!(err)),
        }

        while let Some(joined) = sort_pool.join_next().await {
            collect_worker_result(joined, &mut first_error);
        }
        // Every sort worker has exited: nothing new enters the merge
        // queue except merge results, so it can be closed exactly once.
        unmerged.close();

        while let Some(joined) = merge_pool.join_next().await {
            collect_worker_result(joined, &mut first_error);
        }

        if let Some(monitor) = monitor {
            monitor.abort();
        }

        if self.shutdown_flag.load(Ordering::Relaxed) {
            bail!("sort interrupted before completion");
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        if self.config.verbose {
            println!("Sort complete! Saving file...");
        }
        self.finalize_output(&store, &unmerged, &outcome)?;

        // Every chunk has been consumed by now, so the directory is empty.
        let _ = fs::remove_dir(&self.config.temp_directory);

        Ok(SortStats {
            records_sorted: outcome.records,
            chunks_created: outcome.chunks,
            merges_completed: merges_completed.load(Ordering::Relaxed),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            process_memory_mb: current_process_memory_mb(),
        })
    }

    /// Wipes any earlier run's leftovers: the output file and the whole
    /// temp directory, which is then recreated empty.
    fn prepare_workspace(&self) -> Result<()> {
        if self.config.output_path.exists() {
            fs::remove_file(&self.config.output_path).with_context(|| {
                format!(
                    "failed to remove stale output {}",
                    self.config.output_path.display()
                )
            })?;
        }

        let temp = &self.config.temp_directory;
        if temp.exists() {
            fs::remove_dir_all(temp)
                .with_context(|| format!("failed to clear temp directory {}", temp.display()))?;
        }
        fs::create_dir_all(temp)
            .with_context(|| format!("failed to create temp directory {}", temp.display()))?;
        Ok(())
    }

    fn spawn_splitter(
        &self,
        store: Arc<ChunkStore>,
        unsorted_tx: Sender<ChunkHandle>,
    ) -> JoinHandle<Result<SplitOutcome>> {
        let splitter = Splitter::new(
            self.config.input_path.clone(),
            self.config.max_lines_per_chunk,
            self.config.io_buffer_size_bytes(),
        );
        let shutdown = Arc::clone(&self.shutdown_flag);

        tokio::spawn(async move {
            let result = splitter.run(&store, &unsorted_tx, &shutdown);
            // Closing the channel is the "splitting done" signal, on the
            // error path too, or the sort pool would wait forever.
            unsorted_tx.close();
            result
        })
    }

    fn spawn_sort_pool(
        &self,
        store: &Arc<ChunkStore>,
        unsorted: &Receiver<ChunkHandle>,
        unmerged: &Arc<MergeQueue>,
    ) -> JoinSet<Result<()>> {
        let mut pool = JoinSet::new();

        for _ in 0..self.config.pool_size {
            let store = Arc::clone(store);
            let unsorted = unsorted.clone();
            let unmerged = Arc::clone(unmerged);
            let shutdown = Arc::clone(&self.shutdown_flag);

            pool.spawn(async move {
                // Blocks while the splitter is still producing; the loop
                // ends only once the channel is closed and drained.
                while let Ok(handle) = unsorted.recv().await {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let mut records = store.read(&handle)?;
                    memsort::sort(&mut records);
                    store.write(&handle, &records)?;
                    unmerged.publish(handle);
                }
                Ok(())
            });
        }
        pool
    }

    fn spawn_merge_pool(
        &self,
        store: &Arc<ChunkStore>,
        unmerged: &Arc<MergeQueue>,
        merges_completed: &Arc<AtomicUsize>,
    ) -> JoinSet<Result<()>> {
        let mut pool = JoinSet::new();

        for _ in 0..self.config.pool_size {
            let store = Arc::clone(store);
            let unmerged = Arc::clone(unmerged);
            let shutdown = Arc::clone(&self.shutdown_flag);
            let merges_completed = Arc::clone(merges_completed);

            pool.spawn(async move {
                // Workers only ever see pairs; the terminal chunk is left
                // for the processor's single-threaded reduction.
                while let Some((left, right)) = unmerged.claim_pair().await {
                    if shutdown.load(Ordering::Relaxed) {
                        unmerged.abort_claim();
                        break;
                    }
                    let merged = match merger::merge_chunks(&store, &left, &right) {
                        Ok(merged) => merged,
                        Err(err) => {
                            unmerged.abort_claim();
                            return Err(err);
                        }
                    };
                    unmerged.publish_merged(merged);
                    store.delete(left)?;
                    store.delete(right)?;
                    merges_completed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            });
        }
        pool
    }

    /// Queue-depth reporter. Purely observational: it is aborted at run
    /// end, never joined, and correctness does not depend on it.
    fn spawn_monitor(
        &self,
        unsorted: Receiver<ChunkHandle>,
        unmerged: Arc<MergeQueue>,
    ) -> Option<JoinHandle<()>> {
        if !self.config.verbose {
            return None;
        }

        Some(tokio::spawn(async move {
            let mut last_depths = (usize::MAX, usize::MAX);
            loop {
                let depths = (unsorted.len(), unmerged.depth());
                if depths != last_depths {
                    println!("queue depth sort/merge: {}/{}", depths.0, depths.1);
                    last_depths = depths;
                }
                tokio::time::sleep(Duration::from_millis(MONITOR_INTERVAL_MS)).await;
            }
        }))
    }

    /// The unique path that produces output: move the surviving chunk to
    /// the output location, or create an empty output when the input had
    /// no records at all.
    fn finalize_output(
        &self,
        store: &ChunkStore,
        unmerged: &MergeQueue,
        outcome: &SplitOutcome,
    ) -> Result<()> {
        match unmerged.take_final() {
            Some(handle) => store.finalize(handle, &self.config.output_path),
            None if outcome.records == 0 => {
                fs::File::create(&self.config.output_path).with_context(|| {
                    format!(
                        "failed to create output {}",
                        self.config.output_path.display()
                    )
                })?;
                Ok(())
            }
            None => bail!("merge pipeline finished without a surviving chunk"),
        }
    }
}

fn collect_worker_result(
    joined: Result<Result<()>, JoinError>,
    first_error: &mut Option<anyhow::Error>,
) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            if first_error.is_none() {
                *first_error = Some(err);
            }
        }
        Err(err) => {
            if first_error.is_none() {
                *first_error = Some(anyhow!(err));
            }
        }
    }
}

fn current_process_memory_mb() -> f64 {
    use sysinfo::{ProcessesToUpdate, System};

    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0.0;
    };

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system
        .process(pid)
        .map(|process| process.memory() as f64 / BYTES_PER_MB as f64)
        .unwrap_or(0.0)
}
