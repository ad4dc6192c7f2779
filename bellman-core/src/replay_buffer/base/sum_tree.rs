//! Sum tree for proportional sampling under prioritized replay.
//!
//! The layout follows the classic array-backed sum tree used by the DQN
//! reference implementations (jaromiru's SumTree and openai/baselines'
//! replay buffer), with segment trees on the side for min/max queries.
use segment_tree::{
    ops::{MaxIgnoreNaN, MinIgnoreNaN},
    SegmentPoint,
};
use serde::{Deserialize, Serialize};

/// How importance weights of a sampled batch are normalized.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum WeightNormalizer {
    /// Divide by the largest possible weight over all stored transitions,
    /// computed from the smallest stored priority.
    All,

    /// Divide by the largest weight within the sampled batch, so the
    /// largest effective learning-rate scale in the batch is exactly 1.
    Batch,
}

/// Binary tree over one priority per buffer slot.
///
/// Leaves hold `(p + eps)^alpha` for the raw priority `p` last assigned to
/// the slot; interior nodes hold subtree sums, so the root is the total
/// mass and proportional sampling is a single root-to-leaf descent. Two
/// `SegmentPoint` trees track the minimum transformed and the maximum raw
/// priority for weight normalization and max-priority inserts.
#[derive(Debug)]
pub struct SumTree {
    eps: f32,
    alpha: f32,
    capacity: usize,
    n_samples: usize,
    raw: Vec<f32>,
    tree: Vec<f32>,
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
    normalize: WeightNormalizer,
}

impl SumTree {
    pub fn new(capacity: usize, alpha: f32, eps: f32, normalize: WeightNormalizer) -> Self {
        Self {
            eps,
            alpha,
            capacity,
            n_samples: 0,
            raw: vec![0f32; capacity],
            tree: vec![0f32; 2 * capacity - 1],
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
            max_tree: SegmentPoint::build(vec![1f32; capacity], MaxIgnoreNaN),
            normalize,
        }
    }

    fn propagate(&mut self, ix: usize, change: f32) {
        let parent = (ix - 1) / 2;
        self.tree[parent] += change;
        if parent != 0 {
            self.propagate(parent, change);
        }
    }

    fn retrieve(&self, ix: usize, s: f32) -> usize {
        let left = 2 * ix + 1;
        let right = left + 1;

        if left >= self.tree.len() {
            return ix;
        }

        if s <= self.tree[left] || self.tree[right] == 0f32 {
            self.retrieve(left, s)
        } else {
            self.retrieve(right, s - self.tree[left])
        }
    }

    /// Sum of all transformed priorities.
    pub fn total(&self) -> f32 {
        self.tree[0]
    }

    /// Largest raw priority currently stored, floored at 1 so that fresh
    /// transitions are sampleable before their first TD error.
    pub fn max_raw(&self) -> f32 {
        self.max_tree.query(0, self.max_tree.len()).max(1.0)
    }

    /// Raw priority leaves, for checkpointing.
    pub fn leaves(&self) -> &[f32] {
        &self.raw
    }

    /// Number of leaves that have been written at least once, capped at
    /// capacity.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Writes the priority of a newly inserted transition at `ix`.
    pub fn add(&mut self, ix: usize, p: f32) {
        self.update(ix, p);
        if self.n_samples < self.capacity {
            self.n_samples += 1;
        }
    }

    /// Updates the raw priority at `ix`.
    pub fn update(&mut self, ix: usize, p: f32) {
        assert!(ix < self.capacity, "priority index {} out of range", ix);
        debug_assert!(p >= 0.0 && p.is_finite());

        self.raw[ix] = p;
        let p_alpha = (p + self.eps).powf(self.alpha);
        self.min_tree.modify(ix, p_alpha);
        self.max_tree.modify(ix, p);
        let ix = ix + self.capacity - 1;
        let change = p_alpha - self.tree[ix];
        self.tree[ix] = p_alpha;
        self.propagate(ix, change);
    }

    /// Leaf index where the prefix sum of priorities first exceeds `s`.
    pub fn get(&self, s: f32) -> usize {
        let ix = self.retrieve(0, s);
        debug_assert!(ix >= (self.capacity - 1));
        ix + 1 - self.capacity
    }

    /// Samples `batch_size` leaf indices proportionally to their priority
    /// and returns them with normalized importance weights.
    ///
    /// The raw weight is `(N * P(i))^-beta`; normalization is governed by
    /// the configured [`WeightNormalizer`].
    pub fn sample(&self, batch_size: usize, beta: f32) -> (Vec<usize>, Vec<f32>) {
        let p_sum = self.total();
        let ixs = (0..batch_size)
            .map(|_| self.get(p_sum * fastrand::f32()))
            .collect::<Vec<_>>();

        let n = self.n_samples as f32 / p_sum;
        let ws = ixs
            .iter()
            .map(|ix| self.tree[ix + self.capacity - 1])
            .map(|p| (n * p).powf(-beta))
            .collect::<Vec<_>>();

        let w_max_inv = match self.normalize {
            WeightNormalizer::All => (n * self.min_tree.query(0, self.min_tree.len())).powf(beta),
            WeightNormalizer::Batch => 1f32 / ws.iter().fold(f32::NAN, |m, v| v.max(m)),
        };
        let ws = ws.iter().map(|w| w * w_max_inv).collect::<Vec<f32>>();

        (ixs, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::{SumTree, WeightNormalizer};

    fn tree_with(data: &[f32]) -> SumTree {
        let mut sum_tree = SumTree::new(8, 1.0, 0.0, WeightNormalizer::Batch);
        for (ix, p) in data.iter().enumerate() {
            sum_tree.add(ix, *p);
        }
        sum_tree
    }

    #[test]
    fn test_prefix_lookup() {
        let sum_tree = tree_with(&[0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9]);

        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.5), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
    }

    #[test]
    fn test_sampling_proportions() {
        fastrand::seed(7);
        let data = [0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let sum_tree = tree_with(&data);

        let n_samples = 100_000;
        let (ixs, _) = sum_tree.sample(n_samples, 1.0);
        assert!(ixs.iter().all(|&ix| ix < data.len()));

        for ix in 0..data.len() {
            let expected = data[ix] / sum_tree.total() * n_samples as f32;
            let count = ixs.iter().filter(|&&e| e == ix).count() as f32;
            assert!(
                (count - expected).abs() < n_samples as f32 * 0.01,
                "ix={}: count={} expected={}",
                ix,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_update_moves_mass() {
        let mut sum_tree = tree_with(&[1.0, 1.0, 1.0, 1.0]);
        assert!((sum_tree.total() - 4.0).abs() < 1e-6);
        sum_tree.update(2, 5.0);
        assert!((sum_tree.total() - 8.0).abs() < 1e-6);
        assert_eq!(sum_tree.get(4.5), 2);
    }

    #[test]
    fn test_max_raw_floor() {
        let mut sum_tree = SumTree::new(4, 0.6, 1e-8, WeightNormalizer::Batch);
        assert_eq!(sum_tree.max_raw(), 1.0);
        sum_tree.add(0, 0.3);
        assert_eq!(sum_tree.max_raw(), 1.0);
        sum_tree.add(1, 2.5);
        assert_eq!(sum_tree.max_raw(), 2.5);
    }

    #[test]
    fn test_weights_capped_at_one() {
        fastrand::seed(11);
        let sum_tree = tree_with(&[0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9]);
        let (_, ws) = sum_tree.sample(64, 0.4);
        assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0 + 1e-6));
        assert!(ws.iter().any(|&w| (w - 1.0).abs() < 1e-6));
    }
}
