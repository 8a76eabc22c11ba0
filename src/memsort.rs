//! In-memory chunk sorting.

use std::cmp::Ordering;

use crate::comparator;
use crate::constants::MEMSORT_PARALLEL_CUTOFF;

/// Sorts a chunk's records in place with a top-down merge sort: split at
/// the midpoint, order each half, merge the halves with a two-pointer
/// lowest-first pass. Ties take the left side, so the sort is stable and
/// in-chunk order agrees with what the streaming chunk merge produces.
///
/// Halves above a cutoff are sorted on rayon in parallel; the result is
/// identical either way.
pub fn sort(records: &mut [String]) {
    let len = records.len();
    if len < 2 {
        return;
    }

    let mid = len / 2;
    let (left, right) = records.split_at_mut(mid);

    if len >= MEMSORT_PARALLEL_CUTOFF {
        rayon::join(|| sort(left), || sort(right));
    } else {
        sort(left);
        sort(right);
    }

    merge_halves(records, mid);
}

/// Merges two adjacent sorted runs `[..mid]` and `[mid..]` back into the
/// slice. Records are moved out into scratch buffers rather than cloned.
fn merge_halves(records: &mut [String], mid: usize) {
    let mut left: Vec<String> = records[..mid].iter_mut().map(std::mem::take).collect();
    let mut right: Vec<String> = records[mid..].iter_mut().map(std::mem::take).collect();

    let mut i = 0;
    let mut j = 0;

    for slot in records.iter_mut() {
        let take_left = if i < left.len() && j < right.len() {
            comparator::compare(&left[i], &right[j]) != Ordering::Greater
        } else {
            i < left.len()
        };

        if take_left {
            *slot = std::mem::take(&mut left[i]);
            i += 1;
        } else {
            *slot = std::mem::take(&mut right[j]);
            j += 1;
        }
    }
}
