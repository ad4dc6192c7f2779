//! Lagged ("target") network synchronization.
//!
//! Bootstrapped training targets become unstable when they are computed
//! from the network currently being optimized. Algorithms therefore keep a
//! delayed shadow copy of each model and read targets from it. The
//! [`LaggedNetworkManager`] owns the shadows and applies one of two update
//! disciplines: periodic full copies (DQN-style, driven by the algorithm's
//! own step counter) or continuous Polyak averaging (DDPG/SAC-style, every
//! optimizer step).
//!
//! Parameters are plain named [`ndarray`] arrays ([`ParamSet`]); no
//! gradient ever exists for a shadow and the manager must never appear in
//! an optimizer's parameter list.
mod manager;
mod param_set;

pub use manager::{LaggedNetworkManager, SharedParams, SyncRule};
pub use param_set::ParamSet;
