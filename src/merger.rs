//! Two-way streaming merge of sorted chunks.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use anyhow::Result;

use crate::chunk::{ChunkHandle, ChunkStore};
use crate::comparator;

/// Merges two sorted chunks into a freshly named chunk, holding one record
/// from each side in memory at a time: whichever head is lower goes out
/// first, ties take the left side, and an exhausted side compares as
/// maximal so the other simply drains. The inputs stay on disk; the caller
/// deletes them once the result is published.
pub fn merge_chunks(
    store: &ChunkStore,
    left: &ChunkHandle,
    right: &ChunkHandle,
) -> Result<ChunkHandle> {
    let mut left_reader = store.open_reader(left)?;
    let mut right_reader = store.open_reader(right)?;

    let target = store.merge_target();
    let mut writer = store.open_writer(&target)?;

    let mut left_head = read_record(&mut left_reader)?;
    let mut right_head = read_record(&mut right_reader)?;
    let mut written = 0;

    while left_head.is_some() || right_head.is_some() {
        let take_left = comparator::compare_optional(left_head.as_deref(), right_head.as_deref())
            != Ordering::Greater;

        if take_left {
            if let Some(record) = left_head.take() {
                writeln!(writer, "{}", record)?;
                written += 1;
                left_head = read_record(&mut left_reader)?;
            }
        } else if let Some(record) = right_head.take() {
            writeln!(writer, "{}", record)?;
            written += 1;
            right_head = read_record(&mut right_reader)?;
        }
    }

    writer.flush()?;
    Ok(ChunkHandle::new(target, written))
}

/// Next record from a chunk reader, skipping blank separators such as a
/// trailing newline. `None` means the source is exhausted.
fn read_record(reader: &mut BufReader<File>) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let record = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if record.is_empty() {
            continue;
        }
        return Ok(Some(record.to_string()));
    }
}
