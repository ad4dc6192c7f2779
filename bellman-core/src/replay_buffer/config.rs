//! Configuration of the replay buffer and of prioritized sampling.
use super::WeightNormalizer;
use crate::error::BellmanError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration for prioritized experience replay.
///
/// Sampling probabilities are proportional to `(|td_err| + eps)^alpha`; the
/// importance-sampling exponent is scheduled linearly from `beta_0` to
/// `beta_final` over `n_opts_final` optimization steps.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Priority exponent. 0 recovers uniform sampling.
    pub alpha: f32,

    /// Initial importance-sampling exponent.
    pub beta_0: f32,

    /// Final importance-sampling exponent, typically 1.0.
    pub beta_final: f32,

    /// Optimization steps after which beta reaches its final value.
    pub n_opts_final: usize,

    /// Floor added to TD errors before exponentiation, so no stored
    /// transition ever becomes unsampleable.
    pub eps: f32,

    /// How importance weights are normalized.
    pub normalize: WeightNormalizer,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 500_000,
            eps: 1e-8,
            normalize: WeightNormalizer::Batch,
        }
    }
}

impl PerConfig {
    /// Sets the priority exponent.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial importance-sampling exponent.
    pub fn beta_0(mut self, beta_0: f32) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the final importance-sampling exponent.
    pub fn beta_final(mut self, beta_final: f32) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the number of optimization steps of the beta schedule.
    pub fn n_opts_final(mut self, n_opts_final: usize) -> Self {
        self.n_opts_final = n_opts_final;
        self
    }

    /// Sets the weight normalization method.
    pub fn normalize(mut self, normalize: WeightNormalizer) -> Self {
        self.normalize = normalize;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BellmanError> {
        if self.alpha < 0.0 || !self.alpha.is_finite() {
            return Err(BellmanError::InvalidAlpha(self.alpha));
        }
        for beta in [self.beta_0, self.beta_final] {
            if !(0.0..=1.0).contains(&beta) {
                return Err(BellmanError::InvalidBeta(beta));
            }
        }
        Ok(())
    }
}

/// Configuration for [`ReplayBuffer`](super::ReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Transitions stored per sub-buffer. When the ring is full, new
    /// transitions overwrite the oldest ones.
    pub capacity: usize,

    /// Number of parallel environments, one ring each.
    pub env_num: usize,

    /// Seed of the uniform sampler.
    pub seed: u64,

    /// Prioritized replay configuration; `None` samples uniformly.
    pub per_config: Option<PerConfig>,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            env_num: 1,
            seed: 42,
            per_config: None,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the per-sub-buffer capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of parallel sub-buffers.
    pub fn env_num(mut self, env_num: usize) -> Self {
        self.env_num = env_num;
        self
    }

    /// Sets the sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables prioritized replay.
    pub fn per_config(mut self, per_config: Option<PerConfig>) -> Self {
        self.per_config = per_config;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BellmanError> {
        if self.capacity == 0 {
            return Err(BellmanError::InvalidCapacity(self.capacity));
        }
        if self.env_num == 0 {
            return Err(BellmanError::InvalidEnvNum(self.env_num));
        }
        if let Some(per) = &self.per_config {
            per.validate()?;
        }
        Ok(())
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
