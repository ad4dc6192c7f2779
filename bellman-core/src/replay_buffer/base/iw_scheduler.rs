//! Scheduling of the importance-weight exponent for prioritized replay.
use serde::{Deserialize, Serialize};

/// Linear schedule of the importance-sampling exponent beta.
///
/// Beta grows from `beta_0` to `beta_final` over `n_opts_final` optimization
/// steps and stays at `beta_final` afterwards. The step counter advances
/// once per priority update, i.e. once per optimization step.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    beta_0: f32,
    beta_final: f32,
    n_opts_final: usize,
    n_opts: usize,
}

impl IwScheduler {
    /// Creates a scheduler starting at step 0.
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_opts_final,
            n_opts: 0,
        }
    }

    /// Current value of the importance-sampling exponent.
    pub fn beta(&self) -> f32 {
        if self.n_opts >= self.n_opts_final {
            self.beta_final
        } else {
            let d = self.beta_final - self.beta_0;
            self.beta_0 + d * (self.n_opts as f32 / self.n_opts_final as f32)
        }
    }

    /// Advances the schedule by one optimization step.
    pub fn add_n_opts(&mut self) {
        self.n_opts += 1;
    }

    /// Optimization steps taken so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Restores the schedule position, for checkpoint resume.
    pub fn set_n_opts(&mut self, n_opts: usize) {
        self.n_opts = n_opts;
    }
}

#[cfg(test)]
mod tests {
    use super::IwScheduler;

    #[test]
    fn test_schedule_endpoints() {
        let mut s = IwScheduler::new(0.4, 1.0, 10);
        assert!((s.beta() - 0.4).abs() < 1e-6);
        for _ in 0..5 {
            s.add_n_opts();
        }
        assert!((s.beta() - 0.7).abs() < 1e-6);
        for _ in 0..10 {
            s.add_n_opts();
        }
        assert!((s.beta() - 1.0).abs() < 1e-6);
    }
}
