//! Caller-supplied value functions for bootstrapping.
use anyhow::Result;

/// Strategy supplying bootstrap values to the return estimators.
///
/// `evaluate` returns the value estimate of the **next** observation stored
/// at each index, one scalar per index. Algorithms implement it over their
/// own (possibly lagged) networks: plain max-Q, double-Q, ensemble minima
/// and entropy-adjusted targets are all just different implementations of
/// this one method. Closures of the matching signature implement it
/// directly.
///
/// The estimator calls `evaluate` once per batch, never per transition, so
/// implementations are free to batch their network forward pass.
pub trait TargetValue<B: ?Sized> {
    /// Value of the next observation stored at each of `ixs`.
    ///
    /// Must return exactly `ixs.len()` values.
    fn evaluate(&self, buffer: &B, ixs: &[usize]) -> Result<Vec<f32>>;
}

impl<B: ?Sized, F> TargetValue<B> for F
where
    F: Fn(&B, &[usize]) -> Result<Vec<f32>>,
{
    fn evaluate(&self, buffer: &B, ixs: &[usize]) -> Result<Vec<f32>> {
        self(buffer, ixs)
    }
}
