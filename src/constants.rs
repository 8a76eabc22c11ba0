pub const DEFAULT_MAX_LINES_PER_CHUNK: usize = 100_000;
pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_FILE_SIZE_MB: usize = 1000;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;

pub const MIN_LINES_PER_CHUNK: usize = 1;
pub const MAX_LINES_PER_CHUNK: usize = 10_000_000;
pub const MIN_POOL_SIZE: usize = 1;
pub const MAX_POOL_SIZE: usize = 256;
pub const MIN_IO_BUFFER_SIZE_KB: usize = 4;
pub const MAX_IO_BUFFER_SIZE_KB: usize = 16_384;

pub const BYTES_PER_KB: usize = 1024;
pub const BYTES_PER_MB: usize = 1024 * 1024;

pub const TEMP_DIR_NAME: &str = ".sortchunks";
pub const CHUNK_FILE_PREFIX: &str = "chunk_";
pub const MERGE_FILE_PREFIX: &str = "merge_";
pub const CHUNK_FILE_EXTENSION: &str = ".chunk";

pub const KEY_SEPARATOR: char = '.';

pub const MONITOR_INTERVAL_MS: u64 = 500;
pub const SHUTDOWN_CHECK_INTERVAL_LINES: usize = 1000;

/// Chunk halves shorter than this are sorted on the current thread
/// instead of being forked onto rayon.
pub const MEMSORT_PARALLEL_CUTOFF: usize = 4096;

pub const GENERATOR_MAX_KEY: u32 = 1000;
pub const GENERATOR_SECOND_WORD_PROBABILITY: f64 = 0.5;
