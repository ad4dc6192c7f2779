//! Errors in the library.
use thiserror::Error;

/// Errors raised when validating configurations at construction time.
///
/// Contract violations (indexing an unwritten buffer slot, registering
/// mismatched lagged-network architectures, non-chronological batches) are
/// programming errors and panic instead of returning one of these.
#[derive(Error, Debug)]
pub enum BellmanError {
    /// Discount factor outside `[0, 1]`.
    #[error("discount factor should be in [0, 1] but got: {0}")]
    InvalidDiscountFactor(f32),

    /// GAE lambda outside `[0, 1]`.
    #[error("gae_lambda should be in [0, 1] but got: {0}")]
    InvalidGaeLambda(f32),

    /// Polyak smoothing constant outside `(0, 1]`.
    #[error("tau should be in (0, 1] but got: {0}")]
    InvalidTau(f32),

    /// Non-positive lookahead step count.
    #[error("n_step should be greater than 0 but got: {0}")]
    InvalidNStep(usize),

    /// Non-positive buffer capacity.
    #[error("capacity should be greater than 0 but got: {0}")]
    InvalidCapacity(usize),

    /// Non-positive number of parallel sub-buffers.
    #[error("env_num should be greater than 0 but got: {0}")]
    InvalidEnvNum(usize),

    /// Negative priority exponent.
    #[error("alpha should be non-negative but got: {0}")]
    InvalidAlpha(f32),

    /// Importance-sampling exponent outside `[0, 1]`.
    #[error("beta should be in [0, 1] but got: {0}")]
    InvalidBeta(f32),

    /// Non-positive chunk size for value evaluation.
    #[error("max_batchsize should be greater than 0 but got: {0}")]
    InvalidMaxBatchsize(usize),

    /// Sampling from a buffer that holds no transitions.
    #[error("replay buffer is empty")]
    EmptyBuffer,
}
