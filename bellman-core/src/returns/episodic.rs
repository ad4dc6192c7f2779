//! Advantage and Monte-Carlo return estimation over whole episodes.
use super::ReturnNormalizer;
use crate::{error::BellmanError, TransitionBufferBase};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Marks the batch positions where the backward recursion must reset.
///
/// A position ends an episode run when its transition is terminated or
/// truncated, when it sits at the buffer's write frontier, or when its
/// successor in the batch is not its chronological successor in the buffer
/// (a wraparound split or a foreign episode's data). Treating the latter as
/// a boundary slightly truncates a return instead of silently mixing
/// episodes.
fn end_flags<B: TransitionBufferBase>(buffer: &B, indices: &[usize]) -> Vec<bool> {
    let n = indices.len();
    (0..n)
        .map(|j| {
            let ix = indices[j];
            let next = buffer.next_index(ix);
            buffer.is_terminated(ix)
                || buffer.is_truncated(ix)
                || next == ix
                || j + 1 == n
                || indices[j + 1] != next
        })
        .collect()
}

// Bootstrap values are only valid where the trajectory actually continues;
// a terminated transition has no continuation value.
fn masked_next_values<B: TransitionBufferBase>(
    buffer: &B,
    indices: &[usize],
    v_s_: &[f32],
) -> Vec<f32> {
    indices
        .iter()
        .zip(v_s_.iter())
        .map(|(&ix, &v)| if buffer.is_terminated(ix) { 0.0 } else { v })
        .collect()
}

/// Backward GAE recursion over one batch.
///
/// `v_next` must already be masked at terminated transitions. The residual
/// keeps its bootstrap term at truncations, while `end_flag` stops the
/// recursion at every episode boundary.
fn gae_advantage(
    v_s: &[f32],
    v_next: &[f32],
    rew: &[f32],
    end_flag: &[bool],
    gamma: f32,
    lambda: f32,
) -> Vec<f32> {
    let n = rew.len();
    let mut adv = vec![0f32; n];
    let mut gae = 0f32;
    for i in (0..n).rev() {
        let delta = rew[i] + gamma * v_next[i] - v_s[i];
        let discount = if end_flag[i] { 0.0 } else { gamma * lambda };
        gae = delta + discount * gae;
        adv[i] = gae;
    }
    adv
}

/// Configuration for [`Gae`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GaeConfig {
    /// Discount factor in `[0, 1]`.
    pub gamma: f32,

    /// Bias/variance trade-off in `[0, 1]`. 1 recovers Monte-Carlo
    /// advantages, 0 the one-step TD residual.
    pub gae_lambda: f32,

    /// Largest chunk the caller evaluates value functions in; see
    /// [`Gae::max_batchsize`].
    pub max_batchsize: usize,

    /// Normalize returns by the running statistics of previous batches.
    pub reward_normalization: bool,

    /// Subtract the running mean when normalizing. Off by default: the
    /// actor-critic lineage of this estimator deliberately only rescales.
    pub subtract_mean: bool,
}

impl Default for GaeConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            gae_lambda: 0.95,
            max_batchsize: 256,
            reward_normalization: false,
            subtract_mean: false,
        }
    }
}

impl GaeConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets lambda.
    pub fn gae_lambda(mut self, gae_lambda: f32) -> Self {
        self.gae_lambda = gae_lambda;
        self
    }

    /// Sets the value-evaluation chunk bound.
    pub fn max_batchsize(mut self, max_batchsize: usize) -> Self {
        self.max_batchsize = max_batchsize;
        self
    }

    /// Enables or disables return normalization.
    pub fn reward_normalization(mut self, reward_normalization: bool) -> Self {
        self.reward_normalization = reward_normalization;
        self
    }

    /// Enables or disables mean subtraction under normalization.
    pub fn subtract_mean(mut self, subtract_mean: bool) -> Self {
        self.subtract_mean = subtract_mean;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Generalized Advantage Estimation.
///
/// The caller supplies per-transition value estimates `V(s_i)` (`v_s`) and
/// `V(s_{i+1})` (`v_s_`) for the whole batch, evaluated in chunks of at
/// most [`max_batchsize`](Self::max_batchsize) transitions (see
/// [`crate::util::chunks`]). The batch must list each sub-buffer's indices
/// in chronological order; any position violating that is treated as an
/// episode boundary rather than corrupting a neighboring episode.
///
/// With normalization enabled, the supplied values live in normalized
/// return space; they are mapped back through the previous batches'
/// statistics before the TD residual is formed, and the final returns are
/// renormalized afterwards, so normalization never changes the residual's
/// meaning.
pub struct Gae {
    gamma: f32,
    lambda: f32,
    max_batchsize: usize,
    normalizer: Option<ReturnNormalizer>,
}

impl Gae {
    /// Creates the estimator, validating the configuration.
    pub fn build(config: &GaeConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(BellmanError::InvalidDiscountFactor(config.gamma).into());
        }
        if !(0.0..=1.0).contains(&config.gae_lambda) {
            return Err(BellmanError::InvalidGaeLambda(config.gae_lambda).into());
        }
        if config.max_batchsize == 0 {
            return Err(BellmanError::InvalidMaxBatchsize(config.max_batchsize).into());
        }
        Ok(Self {
            gamma: config.gamma,
            lambda: config.gae_lambda,
            max_batchsize: config.max_batchsize,
            normalizer: config
                .reward_normalization
                .then(|| ReturnNormalizer::new(config.subtract_mean)),
        })
    }

    /// Upper bound on the chunk size callers should evaluate value
    /// functions in, to bound peak memory.
    pub fn max_batchsize(&self) -> usize {
        self.max_batchsize
    }

    /// Computes `(returns, advantages)` for the batch.
    ///
    /// `v_s[j]` and `v_s_[j]` are the value estimates of the observation
    /// and next observation stored at `indices[j]`. Advantages are
    /// returned in unnormalized space.
    pub fn compute<B: TransitionBufferBase>(
        &mut self,
        buffer: &B,
        indices: &[usize],
        v_s: &[f32],
        v_s_: &[f32],
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        assert_eq!(indices.len(), v_s.len(), "one V(s) per index");
        assert_eq!(indices.len(), v_s_.len(), "one V(s') per index");
        if indices.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut v_s = v_s.to_vec();
        let mut v_s_ = v_s_.to_vec();
        if let Some(norm) = &self.normalizer {
            norm.unnormalize(&mut v_s);
            norm.unnormalize(&mut v_s_);
        }
        let v_next = masked_next_values(buffer, indices, &v_s_);
        let rew = indices.iter().map(|&ix| buffer.reward(ix)).collect::<Vec<_>>();
        let end_flag = end_flags(buffer, indices);

        let adv = gae_advantage(&v_s, &v_next, &rew, &end_flag, self.gamma, self.lambda);
        let unnormalized = v_s
            .iter()
            .zip(adv.iter())
            .map(|(v, a)| v + a)
            .collect::<Vec<_>>();

        let returns = match &mut self.normalizer {
            Some(norm) => norm.normalize_and_update(&unnormalized),
            None => unnormalized,
        };
        Ok((returns, adv))
    }
}

/// Configuration for [`DiscountedReturn`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DiscountedReturnConfig {
    /// Discount factor in `[0, 1]`.
    pub gamma: f32,

    /// Normalize returns by the running statistics of previous batches.
    pub reward_normalization: bool,

    /// Subtract the running mean when normalizing. On by default, the
    /// REINFORCE lineage's choice.
    pub subtract_mean: bool,
}

impl Default for DiscountedReturnConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            reward_normalization: false,
            subtract_mean: true,
        }
    }
}

impl DiscountedReturnConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Enables or disables return normalization.
    pub fn reward_normalization(mut self, reward_normalization: bool) -> Self {
        self.reward_normalization = reward_normalization;
        self
    }

    /// Enables or disables mean subtraction under normalization.
    pub fn subtract_mean(mut self, subtract_mean: bool) -> Self {
        self.subtract_mean = subtract_mean;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Full Monte-Carlo discounted return estimator.
///
/// Equivalent to the n-step case with unbounded `n`: every reward until the
/// episode boundary is accumulated. Indices at the buffer's unfinished
/// frontier cannot close their sum with a real terminal reward, so they
/// bootstrap from the caller-supplied `v_s_` stand-in instead of walking
/// off the end of recorded data.
pub struct DiscountedReturn {
    gamma: f32,
    normalizer: Option<ReturnNormalizer>,
}

impl DiscountedReturn {
    /// Creates the estimator, validating the configuration.
    pub fn build(config: &DiscountedReturnConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(BellmanError::InvalidDiscountFactor(config.gamma).into());
        }
        Ok(Self {
            gamma: config.gamma,
            normalizer: config
                .reward_normalization
                .then(|| ReturnNormalizer::new(config.subtract_mean)),
        })
    }

    /// Computes one discounted return per index.
    ///
    /// `v_s_[j]` stands in for all future reward at `indices[j]` when that
    /// index has no recorded continuation; it is ignored (masked to zero)
    /// at terminated transitions.
    pub fn compute<B: TransitionBufferBase>(
        &mut self,
        buffer: &B,
        indices: &[usize],
        v_s_: &[f32],
    ) -> Result<Vec<f32>> {
        assert_eq!(indices.len(), v_s_.len(), "one stand-in value per index");
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let v_next = masked_next_values(buffer, indices, v_s_);
        // Rolling the bootstrap values one step right gives a baseline that
        // telescopes away under lambda = 1, leaving the pure Monte-Carlo
        // return once the baseline is added back.
        let n = indices.len();
        let mut v_s = vec![0f32; n];
        v_s[0] = v_next[n - 1];
        v_s[1..].copy_from_slice(&v_next[..n - 1]);

        let rew = indices.iter().map(|&ix| buffer.reward(ix)).collect::<Vec<_>>();
        let end_flag = end_flags(buffer, indices);
        let adv = gae_advantage(&v_s, &v_next, &rew, &end_flag, self.gamma, 1.0);
        let unnormalized = v_s
            .iter()
            .zip(adv.iter())
            .map(|(v, a)| v + a)
            .collect::<Vec<_>>();

        Ok(match &mut self.normalizer {
            Some(norm) => norm.normalize_and_update(&unnormalized),
            None => unnormalized,
        })
    }

    /// Computes discounted returns with the running mean of previous
    /// returns standing in at the unfinished frontier.
    pub fn compute_with_mean_bootstrap<B: TransitionBufferBase>(
        &mut self,
        buffer: &B,
        indices: &[usize],
    ) -> Result<Vec<f32>> {
        let stand_in = self.normalizer.as_ref().map(|n| n.mean()).unwrap_or(0.0);
        let v_s_ = vec![stand_in; indices.len()];
        self.compute(buffer, indices, &v_s_)
    }
}
