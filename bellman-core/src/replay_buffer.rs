//! Circular replay storage for transitions, with optional prioritization.
//!
//! [`ReplayBuffer`] stores transitions by column in one ring per parallel
//! environment and exposes the chronology queries (`next_index`,
//! `prev_index`, `unfinished_index`) that the return estimators build on.
//! Prioritized experience replay is layered on the same index space through
//! a sum tree when a [`PerConfig`] is given.
mod base;
mod batch;
mod config;

pub use base::{Pushed, ReplayBuffer, ReplayBufferState};
pub use base::{IwScheduler, WeightNormalizer};
pub use batch::{InfoMap, TransitionBatch};
pub use config::{PerConfig, ReplayBufferConfig};
