//! Batches of transitions, stored and sampled by column.
use crate::{util::flags_to_i8, BatchBase};
use std::collections::HashMap;

/// Auxiliary per-transition values reported by the environment.
pub type InfoMap = HashMap<String, f32>;

/// A batch of transitions, one column per field.
///
/// The same type is used for transitions entering the buffer (built by the
/// collection loop, usually one row per environment step) and for batches
/// sampled out of it. `ix_sample` and `weight` are only filled on the way
/// out: the sampled buffer indices and, under prioritized replay, the
/// normalized importance weights.
pub struct TransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions taken.
    pub act: A,

    /// Observations after the step.
    pub next_obs: O,

    /// Scalar rewards.
    pub reward: Vec<f32>,

    /// Episode termination flags.
    pub is_terminated: Vec<i8>,

    /// Episode truncation flags.
    pub is_truncated: Vec<i8>,

    /// Auxiliary info mappings, one per transition.
    pub info: Vec<InfoMap>,

    /// Buffer indices the batch was sampled at.
    pub ix_sample: Option<Vec<usize>>,

    /// Importance weights from prioritized sampling.
    pub weight: Option<Vec<f32>>,
}

impl<O, A> TransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates a batch from per-field columns, with empty info mappings.
    pub fn new(
        obs: O,
        act: A,
        next_obs: O,
        reward: Vec<f32>,
        is_terminated: &[bool],
        is_truncated: &[bool],
    ) -> Self {
        let len = reward.len();
        assert_eq!(is_terminated.len(), len);
        assert_eq!(is_truncated.len(), len);
        Self {
            obs,
            act,
            next_obs,
            is_terminated: flags_to_i8(is_terminated),
            is_truncated: flags_to_i8(is_truncated),
            info: vec![InfoMap::new(); len],
            reward,
            ix_sample: None,
            weight: None,
        }
    }

    /// Attaches auxiliary info mappings, one per transition.
    pub fn with_info(mut self, info: Vec<InfoMap>) -> Self {
        assert_eq!(info.len(), self.len());
        self.info = info;
        self
    }

    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// True when the batch holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
