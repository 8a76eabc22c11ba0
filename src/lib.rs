//! `hugesort` sorts line-oriented text files too large to hold in memory.
//!
//! The input is split into bounded chunks, each chunk is sorted in memory
//! by a bounded worker pool, and a second pool repeatedly stream-merges
//! pairs of sorted chunks until a single fully ordered file remains. All
//! three stages run concurrently over shared work queues: later stages
//! start consuming before earlier stages finish producing, and the queues
//! carry the "no more work" signal so the pools agree on termination
//! without a central coordinator.
//!
//! Records are lines of the form `<key1>.<key2>[ <key3>]`; ordering is
//! defined by [`comparator`]. The final file is a permutation of the
//! input's non-empty lines in that order, independent of chunk size, pool
//! size and scheduling.
//!
//! ```no_run
//! use hugesort::SorterConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = SorterConfig::default();
//!     config.input_path = "records.txt".into();
//!     config.output_path = "records.txt.sorted".into();
//!
//!     let stats = hugesort::sort_file(config).await?;
//!     println!("sorted {} records", stats.records_sorted);
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod comparator;
pub mod config;
pub mod constants;
pub mod generator;
pub mod memsort;
pub mod merger;
pub mod processor;
pub mod queue;
pub mod splitter;


pub use config::SorterConfig;
pub use generator::FileGenerator;
pub use processor::SortProcessor;

use anyhow::Result;

/// What one completed run did.
#[derive(Debug, Clone, Default)]
pub struct SortStats {
    pub records_sorted: usize,
    pub chunks_created: usize,
    pub merges_completed: usize,
    pub processing_time_ms: u64,
    pub process_memory_mb: f64,
}

/// Sorts `config.input_path` into `config.output_path` with one
/// explicitly owned pipeline.
pub async fn sort_file(config: SorterConfig) -> Result<SortStats> {
    let processor = SortProcessor::new(config)?;
    processor.run().await
}
