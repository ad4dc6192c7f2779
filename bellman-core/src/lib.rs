#![warn(missing_docs)]
//! Core building blocks for reinforcement learning algorithms.
//!
//! This crate provides the pieces that recur in every deep RL algorithm and
//! carry most of the algorithmic risk, independent of any neural network
//! backend:
//!
//! * [`replay_buffer::ReplayBuffer`] - a circular, optionally prioritized
//!   store of transitions from one or more parallel environments, with
//!   episode-boundary queries (`next_index`, `prev_index`,
//!   `unfinished_index`) consumed by the return estimators.
//! * [`returns`] - estimators turning stored rewards and done flags into
//!   training targets: n-step bootstrapped returns
//!   ([`returns::NStepReturn`]), full Monte-Carlo returns
//!   ([`returns::DiscountedReturn`]) and Generalized Advantage Estimation
//!   ([`returns::Gae`]).
//! * [`lagged::LaggedNetworkManager`] - maintains delayed ("target") copies
//!   of model parameters, synchronized either by periodic full copies or by
//!   Polyak averaging.
//! * [`RunningStats`] - an online mean/variance estimator used for
//!   return normalization.
//!
//! Networks, losses, environments and the training loop live outside this
//! crate. They connect through three seams: [`BatchBase`] (columnar storage
//! of observations and actions), [`TargetValue`] (caller-supplied bootstrap
//! values) and [`lagged::ParamSet`] (named parameter arrays).
pub mod error;
pub mod lagged;
pub mod replay_buffer;
pub mod returns;
pub mod util;

mod base;
pub use base::{BatchBase, TargetValue, TransitionBufferBase};

mod stats;
pub use stats::RunningStats;
