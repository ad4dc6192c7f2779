//! Shared batch and indexing utilities.
use std::ops::Range;

/// Splits `0..len` into consecutive ranges of at most `max_chunk` elements.
///
/// Used to bound the memory of value-function evaluation over large batches:
/// callers evaluate each chunk separately and concatenate the results.
pub fn chunks(len: usize, max_chunk: usize) -> impl Iterator<Item = Range<usize>> {
    assert!(max_chunk > 0, "max_chunk should be greater than 0");
    (0..len)
        .step_by(max_chunk)
        .map(move |start| start..(start + max_chunk).min(len))
}

/// Converts bool flags into the `i8` representation stored in buffers.
pub fn flags_to_i8(flags: &[bool]) -> Vec<i8> {
    flags.iter().map(|&f| f as i8).collect()
}

#[cfg(test)]
mod tests {
    use super::chunks;

    #[test]
    fn test_chunks_cover_range() {
        let ranges = chunks(10, 4).collect::<Vec<_>>();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);

        let ranges = chunks(8, 4).collect::<Vec<_>>();
        assert_eq!(ranges, vec![0..4, 4..8]);

        assert_eq!(chunks(0, 4).count(), 0);
        assert_eq!(chunks(3, 64).collect::<Vec<_>>(), vec![0..3]);
    }
}
