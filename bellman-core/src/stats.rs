//! Online estimation of mean and variance over a stream of scalars.
use serde::{Deserialize, Serialize};

/// Running mean/variance estimator fed by batches of scalars.
///
/// The aggregate is kept as `(count, mean, m2)` where `m2` is the sum of
/// squared deviations from the mean, and each `update` merges a whole
/// batch's aggregate into it (batched Welford update). The merge is
/// associative up to floating error, so the final estimate does not depend
/// on how the stream was chunked into batches.
///
/// `var` reports the true `m2 / count` without clamping; callers that divide
/// by it apply their own epsilon floor.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RunningStats {
    count: f64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates an empty estimator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a batch of scalars into the running aggregate.
    ///
    /// An empty batch is a no-op.
    pub fn update(&mut self, batch: &[f32]) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len() as f64;
        let mean = batch.iter().map(|&x| x as f64).sum::<f64>() / count;
        let m2 = batch
            .iter()
            .map(|&x| {
                let d = x as f64 - mean;
                d * d
            })
            .sum::<f64>();
        self.merge_parts(count, mean, m2);
    }

    /// Merges another aggregate into this one.
    pub fn merge(&mut self, other: &RunningStats) {
        self.merge_parts(other.count, other.mean, other.m2);
    }

    fn merge_parts(&mut self, count: f64, mean: f64, m2: f64) {
        if count == 0.0 {
            return;
        }
        let total = self.count + count;
        let delta = mean - self.mean;
        self.mean += delta * count / total;
        self.m2 += m2 + delta * delta * self.count * count / total;
        self.count = total;
    }

    /// Number of scalars seen so far.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// Mean of the scalars seen so far, 0 before the first update.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of the scalars seen so far, 0 before the first
    /// update. Never negative.
    pub fn var(&self) -> f64 {
        if self.count > 0.0 {
            (self.m2 / self.count).max(0.0)
        } else {
            0.0
        }
    }

    /// Standard deviation of the scalars seen so far.
    pub fn std(&self) -> f64 {
        self.var().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::RunningStats;

    // Deterministic scalar stream, spread over a few orders of magnitude.
    fn stream(n: usize) -> Vec<f32> {
        let mut state = 0x2545f491u64;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64 * 20.0 - 10.0) as f32
            })
            .collect()
    }

    fn reference(xs: &[f32]) -> (f64, f64) {
        let n = xs.len() as f64;
        let mean = xs.iter().map(|&x| x as f64).sum::<f64>() / n;
        let var = xs
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, var)
    }

    #[test]
    fn test_known_aggregate() {
        let mut stats = RunningStats::new();
        stats.update(&[1.0, 2.0, 3.0, 4.0]);
        assert!((stats.mean() - 2.5).abs() < 1e-12);
        assert!((stats.var() - 1.25).abs() < 1e-12);
        assert_eq!(stats.count(), 4.0);
    }

    #[test]
    fn test_chunking_invariance() {
        let xs = stream(1000);
        let (mean, var) = reference(&xs);

        for chunk in [1usize, 10, 1000] {
            let mut stats = RunningStats::new();
            for c in xs.chunks(chunk) {
                stats.update(c);
            }
            assert!((stats.mean() - mean).abs() < 1e-9, "chunk={}", chunk);
            assert!((stats.var() - var).abs() < 1e-9, "chunk={}", chunk);
            assert_eq!(stats.count(), 1000.0);
        }
    }

    #[test]
    fn test_merge_matches_update() {
        let xs = stream(128);
        let mut whole = RunningStats::new();
        whole.update(&xs);

        let mut left = RunningStats::new();
        let mut right = RunningStats::new();
        left.update(&xs[..40]);
        right.update(&xs[40..]);
        left.merge(&right);

        assert!((left.mean() - whole.mean()).abs() < 1e-9);
        assert!((left.var() - whole.var()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_estimator() {
        let stats = RunningStats::new();
        assert_eq!(stats.count(), 0.0);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.var(), 0.0);

        let mut stats = RunningStats::new();
        stats.update(&[]);
        assert_eq!(stats.count(), 0.0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut stats = RunningStats::new();
        stats.update(&stream(64));
        let s = serde_yaml::to_string(&stats).unwrap();
        let restored: RunningStats = serde_yaml::from_str(&s).unwrap();
        assert_eq!(stats, restored);
    }
}
