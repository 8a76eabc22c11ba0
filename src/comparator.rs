//! Total order over line records.
//!
//! A record has the shape `<key1>.<key2>[ <key3>]`: a decimal digit string,
//! a literal `.`, then the rest of the line. Records order primarily by the
//! text after the dot (case-insensitive) and fall back to the digit string
//! compared *as a string* — `"2"` sorts after `"100"` and before `"415"`.
//! That lexical tie-break is intentional and load-bearing for reproducing
//! the expected output ordering; it is not a numeric sort.

use std::cmp::Ordering;

use crate::constants::KEY_SEPARATOR;

/// Compares two records. An empty record is treated as larger than every
/// real one, which lets a streaming merge drain the surviving source once
/// the other is exhausted.
pub fn compare(left: &str, right: &str) -> Ordering {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => return Ordering::Equal,
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        (false, false) => {}
    }

    let (left_key1, left_key2) = split_keys(left);
    let (right_key1, right_key2) = split_keys(right);

    compare_ignore_case(left_key2, right_key2).then_with(|| left_key1.cmp(right_key1))
}

/// [`compare`] lifted over exhausted sources: `None` sorts after everything.
pub fn compare_optional(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(left), Some(right)) => compare(left, right),
    }
}

/// Whether a line conforms to the record format. Lines that fail this check
/// are rejected at ingestion; they never reach a sort or merge step.
pub fn is_valid_record(line: &str) -> bool {
    line.contains(KEY_SEPARATOR)
}

/// Splits a record at the first `.` into the digit key and the remainder.
///
/// A dotless record falls back to an empty digit key so the order stays
/// total, but the splitter rejects such lines before they get here.
fn split_keys(record: &str) -> (&str, &str) {
    match record.split_once(KEY_SEPARATOR) {
        Some((key1, key2plus)) => (key1, key2plus),
        None => ("", record),
    }
}

fn compare_ignore_case(left: &str, right: &str) -> Ordering {
    let left = left.chars().flat_map(char::to_lowercase);
    let right = right.chars().flat_map(char::to_lowercase);
    left.cmp(right)
}
