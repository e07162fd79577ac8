//! Downsampler
//!
//! Bounded-size, evenly strided subset of an ordered sequence, used to keep
//! narrative prompts small regardless of well size.

/// At most `max_count` elements of `rows`, taken every `len / max_count`-th
/// element starting at index 0.
///
/// Inputs no longer than `max_count` come back unchanged. When the length is
/// not a multiple of `max_count` the stride rounds down, so the sample covers
/// the head of the sequence more densely than its tail.
pub fn downsample<T: Clone>(rows: &[T], max_count: usize) -> Vec<T> {
    if max_count == 0 {
        return Vec::new();
    }
    if rows.len() <= max_count {
        return rows.to_vec();
    }
    let stride = rows.len() / max_count;
    rows.iter().step_by(stride).take(max_count).cloned().collect()
}
