//! Buffer interface consumed by the return estimators.

/// Chronological access to stored transitions.
///
/// Return and advantage estimators only ever need rewards, done flags and
/// neighbor queries, so they are written against this trait rather than a
/// concrete buffer. All indices refer to slots that have been written;
/// passing an unwritten index is a contract violation and panics.
pub trait TransitionBufferBase {
    /// Total number of stored transitions across all sub-buffers.
    fn len(&self) -> usize;

    /// True when no transition has been stored yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reward of the transition at `ix`.
    fn reward(&self, ix: usize) -> f32;

    /// True when the episode ended at `ix` (no continuation value exists).
    fn is_terminated(&self, ix: usize) -> bool;

    /// True when the episode was cut off at `ix` (a continuation value
    /// exists and bootstrapping from it is valid).
    fn is_truncated(&self, ix: usize) -> bool;

    /// Index of the chronologically following transition in the same
    /// sub-buffer, or `ix` itself at the write frontier.
    ///
    /// The successor of an episode's final transition is the first
    /// transition of the next episode; callers detect boundaries through
    /// the done flags, never through buffer position.
    fn next_index(&self, ix: usize) -> usize;

    /// Index of the chronologically preceding transition in the same
    /// sub-buffer, or `ix` itself at the oldest stored transition.
    fn prev_index(&self, ix: usize) -> usize;

    /// For every sub-buffer, the most recent write that is not yet
    /// terminated or truncated (the in-progress episode's tail).
    fn unfinished_index(&self) -> Vec<usize>;
}
