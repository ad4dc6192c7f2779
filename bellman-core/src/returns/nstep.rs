//! n-step bootstrapped return estimation.
use super::ReturnNormalizer;
use crate::{error::BellmanError, TargetValue, TransitionBufferBase};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration for [`NStepReturn`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NStepReturnConfig {
    /// Discount factor in `[0, 1]`.
    pub gamma: f32,

    /// Number of reward steps accumulated before bootstrapping.
    pub n_step: usize,

    /// Divide computed returns by the running standard deviation of
    /// previous batches' returns.
    pub reward_normalization: bool,
}

impl Default for NStepReturnConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            n_step: 1,
            reward_normalization: false,
        }
    }
}

impl NStepReturnConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the lookahead step count.
    pub fn n_step(mut self, n_step: usize) -> Self {
        self.n_step = n_step;
        self
    }

    /// Enables or disables return normalization.
    pub fn reward_normalization(mut self, reward_normalization: bool) -> Self {
        self.reward_normalization = reward_normalization;
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

/// n-step bootstrapped return estimator.
///
/// For each index `i` of a batch, walks forward up to `n_step` transitions
/// through the buffer, accumulating discounted rewards, and closes the sum
/// with a bootstrap value from the caller's [`TargetValue`] strategy:
///
/// * at a `terminated` flag the walk stops and nothing is bootstrapped
///   (the trajectory has no continuation value);
/// * at a `truncated` flag the walk stops but the cutoff still bootstraps;
/// * at the buffer's write frontier fewer than `n_step` rewards are
///   available and the walk bootstraps early;
/// * otherwise the bootstrap is `gamma^n_step * V(s_{i+n_step})`.
///
/// The strategy is evaluated once for the whole batch. With
/// `reward_normalization`, computed returns are divided by
/// `sqrt(running_var + eps)` where the running statistics were fit on
/// previous batches' unnormalized returns, never on the batch being
/// normalized.
pub struct NStepReturn {
    gamma: f32,
    n_step: usize,
    normalizer: Option<ReturnNormalizer>,
}

impl NStepReturn {
    /// Creates the estimator, validating the configuration.
    pub fn build(config: &NStepReturnConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(BellmanError::InvalidDiscountFactor(config.gamma).into());
        }
        if config.n_step == 0 {
            return Err(BellmanError::InvalidNStep(config.n_step).into());
        }
        Ok(Self {
            gamma: config.gamma,
            n_step: config.n_step,
            normalizer: config
                .reward_normalization
                .then(|| ReturnNormalizer::new(false)),
        })
    }

    /// Computes one return per index.
    pub fn compute<B, V>(
        &mut self,
        buffer: &B,
        indices: &[usize],
        target_value: &V,
    ) -> Result<Vec<f32>>
    where
        B: TransitionBufferBase,
        V: TargetValue<B>,
    {
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let bsz = indices.len();
        let mut acc = Vec::with_capacity(bsz);
        let mut terminal = Vec::with_capacity(bsz);
        let mut boot_scale = Vec::with_capacity(bsz);
        for &start in indices {
            let mut cur = start;
            let mut ret = 0f32;
            let mut disc = 1f32;
            let mut bootstrap = true;
            for step in 0..self.n_step {
                ret += disc * buffer.reward(cur);
                disc *= self.gamma;
                if buffer.is_terminated(cur) {
                    bootstrap = false;
                    break;
                }
                if buffer.is_truncated(cur) || step + 1 == self.n_step {
                    break;
                }
                let next = buffer.next_index(cur);
                if next == cur {
                    // Write frontier: the remaining steps do not exist yet.
                    break;
                }
                cur = next;
            }
            acc.push(ret);
            terminal.push(cur);
            boot_scale.push(if bootstrap { disc } else { 0.0 });
        }

        let values = target_value.evaluate(buffer, &terminal)?;
        assert_eq!(
            values.len(),
            bsz,
            "target value strategy returned {} values for {} indices",
            values.len(),
            bsz
        );

        let returns = acc
            .iter()
            .zip(boot_scale.iter())
            .zip(values.iter())
            .map(|((r, s), v)| r + s * v)
            .collect::<Vec<_>>();

        Ok(match &mut self.normalizer {
            Some(norm) => norm.normalize_and_update(&returns),
            None => returns,
        })
    }

    /// The running statistics of unnormalized returns, when normalization
    /// is enabled.
    pub fn normalizer(&self) -> Option<&ReturnNormalizer> {
        self.normalizer.as_ref()
    }
}
