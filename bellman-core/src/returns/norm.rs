//! Return normalization with statistics that lag one batch behind.
use crate::RunningStats;
use serde::{Deserialize, Serialize};

/// Normalizes returns by running statistics fit on *previous* batches.
///
/// Statistics are updated with a batch's unnormalized returns only after
/// that batch has been normalized, so no batch is ever scaled by
/// information computed from itself. Before the first update the normalizer
/// is the identity.
///
/// Whether the running mean is subtracted is a per-algorithm choice:
/// REINFORCE-style preprocessing subtracts it, A2C-style deliberately only
/// rescales (mean subtraction has no theoretical grounding there and is
/// reported to hurt in practice).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReturnNormalizer {
    stats: RunningStats,
    subtract_mean: bool,
    eps: f64,
}

impl ReturnNormalizer {
    /// Creates an identity normalizer that starts learning statistics from
    /// the first update.
    pub fn new(subtract_mean: bool) -> Self {
        Self {
            stats: RunningStats::new(),
            subtract_mean,
            eps: 1e-8,
        }
    }

    /// The scale `sqrt(var + eps)` of the lagged statistics, 1 before the
    /// first update.
    pub fn scale(&self) -> f32 {
        if self.stats.count() > 0.0 {
            (self.stats.var() + self.eps).sqrt() as f32
        } else {
            1.0
        }
    }

    /// The offset subtracted when normalizing, 0 unless mean subtraction is
    /// enabled.
    pub fn offset(&self) -> f32 {
        if self.subtract_mean && self.stats.count() > 0.0 {
            self.stats.mean() as f32
        } else {
            0.0
        }
    }

    /// Running mean of the unnormalized returns seen so far.
    pub fn mean(&self) -> f32 {
        self.stats.mean() as f32
    }

    /// Maps values from normalized back to unnormalized space, in place.
    ///
    /// Value estimates trained against normalized returns live in
    /// normalized space; the TD residual must be formed in unnormalized
    /// space so that its meaning does not depend on the statistics.
    pub fn unnormalize(&self, xs: &mut [f32]) {
        let scale = self.scale();
        let offset = self.offset();
        for x in xs.iter_mut() {
            *x = *x * scale + offset;
        }
    }

    /// Normalizes a batch of unnormalized returns with the lagged
    /// statistics, then absorbs the batch into the statistics.
    pub fn normalize_and_update(&mut self, unnormalized: &[f32]) -> Vec<f32> {
        let scale = self.scale();
        let offset = self.offset();
        let out = unnormalized
            .iter()
            .map(|&x| (x - offset) / scale)
            .collect();
        self.stats.update(unnormalized);
        out
    }

    /// The statistics accumulated so far.
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }
}
