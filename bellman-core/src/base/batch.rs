//! Columnar storage interface for observations and actions.

/// Interface for one column of transition storage.
///
/// A replay buffer stores each transition field in its own contiguous
/// column. Rewards and done flags are plain vectors owned by the buffer;
/// observations and actions are user types behind this trait, so agent
/// crates can back them with whatever tensor representation they use.
///
/// An implementation is used both as long-lived storage (created once with
/// the buffer's total capacity) and as a batch in flight (holding as many
/// rows as the batch has transitions).
pub trait BatchBase {
    /// Creates a column with `capacity` rows.
    fn new(capacity: usize) -> Self;

    /// Writes the rows of `data` at the given indices.
    ///
    /// `data` must hold exactly `ixs.len()` rows.
    fn push(&mut self, ixs: &[usize], data: Self);

    /// Copies the rows at the given indices into a new column.
    fn sample(&self, ixs: &[usize]) -> Self;
}

/// Element-per-row storage. The default choice when one transition's
/// observation (or action) is a single cloneable value.
impl<T: Clone + Default> BatchBase for Vec<T> {
    fn new(capacity: usize) -> Self {
        vec![T::default(); capacity]
    }

    fn push(&mut self, ixs: &[usize], data: Self) {
        debug_assert_eq!(ixs.len(), data.len());
        for (&ix, v) in ixs.iter().zip(data.into_iter()) {
            self[ix] = v;
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        ixs.iter().map(|&ix| self[ix].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::BatchBase;

    #[test]
    fn test_vec_column() {
        let mut col = <Vec<f32> as BatchBase>::new(4);
        BatchBase::push(&mut col, &[1, 3], vec![10.0, 30.0]);
        assert_eq!(col, vec![0.0, 10.0, 0.0, 30.0]);
        assert_eq!(col.sample(&[3, 3, 1]), vec![30.0, 30.0, 10.0]);
    }
}
