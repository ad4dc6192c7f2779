//! Circular replay buffer over parallel environment sub-buffers.
mod iw_scheduler;
mod sum_tree;

use super::{batch::InfoMap, config::PerConfig, ReplayBufferConfig, TransitionBatch};
use crate::{error::BellmanError, BatchBase, TransitionBufferBase};
use anyhow::Result;
use log::{trace, warn};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub use iw_scheduler::IwScheduler;
use sum_tree::SumTree;
pub use sum_tree::WeightNormalizer;

struct PerState {
    sum_tree: SumTree,
    iw_scheduler: IwScheduler,
}

impl PerState {
    fn new(slots: usize, per_config: &PerConfig) -> Self {
        Self {
            sum_tree: SumTree::new(
                slots,
                per_config.alpha,
                per_config.eps,
                per_config.normalize,
            ),
            iw_scheduler: IwScheduler::new(
                per_config.beta_0,
                per_config.beta_final,
                per_config.n_opts_final,
            ),
        }
    }
}

/// Outcome of a push: which slots were written and whether any of the
/// overwritten slots was the start of an episode whose remaining
/// transitions are still stored.
///
/// When the ring wraps into a stored episode it decapitates it; consumers
/// that walk whole episodes (Monte-Carlo preprocessing) use the flags to
/// discard the partial remainder instead of treating its first surviving
/// transition as an episode start.
pub struct Pushed {
    /// Absolute index of each written transition.
    pub indices: Vec<usize>,

    /// Per written transition, true when the slot it replaced was a stored
    /// episode's first transition (and not also its last).
    pub clipped_episode_start: Vec<bool>,
}

/// Circular store of transitions from `env_num` parallel environments.
///
/// Each environment owns one ring of `capacity` slots; absolute indices are
/// `env_id * capacity + slot`. Writing past capacity overwrites the oldest
/// transitions. All fields are stored by column for vectorized access;
/// observation and action columns are any [`BatchBase`] implementation.
///
/// The buffer must be driven from a single collection loop (or from workers
/// owning disjoint `env_id` sets); it performs no internal synchronization.
pub struct ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,
    env_num: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    ep_start: Vec<i8>,
    info: Vec<InfoMap>,
    cursor: Vec<usize>,
    size: Vec<usize>,
    rng: StdRng,
    per_state: Option<PerState>,
}

impl<O, A> ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates a buffer from its configuration.
    ///
    /// Configuration errors are reported here, never at call time.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self> {
        config.validate()?;
        let slots = config.capacity * config.env_num;
        let per_state = config
            .per_config
            .as_ref()
            .map(|per_config| PerState::new(slots, per_config));

        Ok(Self {
            capacity: config.capacity,
            env_num: config.env_num,
            obs: O::new(slots),
            act: A::new(slots),
            next_obs: O::new(slots),
            reward: vec![0.; slots],
            is_terminated: vec![0; slots],
            is_truncated: vec![0; slots],
            ep_start: vec![0; slots],
            info: vec![InfoMap::new(); slots],
            cursor: vec![0; config.env_num],
            size: vec![0; config.env_num],
            rng: StdRng::seed_from_u64(config.seed),
            per_state,
        })
    }

    /// Per-sub-buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of parallel sub-buffers.
    pub fn env_num(&self) -> usize {
        self.env_num
    }

    fn slots(&self) -> usize {
        self.capacity * self.env_num
    }

    fn locate(&self, ix: usize) -> (usize, usize) {
        assert!(ix < self.slots(), "index {} out of range", ix);
        (ix / self.capacity, ix % self.capacity)
    }

    /// True when the slot at `ix` holds a stored transition.
    pub fn is_written(&self, ix: usize) -> bool {
        let (e, l) = self.locate(ix);
        l < self.size[e]
    }

    fn assert_written(&self, ix: usize) {
        assert!(
            self.is_written(ix),
            "index {} has not been written; this is a bug in the caller",
            ix
        );
    }

    // Local index of the most recent write in sub-buffer `e`.
    fn last_local(&self, e: usize) -> Option<usize> {
        match self.size[e] {
            0 => None,
            _ => Some((self.cursor[e] + self.capacity - 1) % self.capacity),
        }
    }

    // Local index of the oldest stored transition in sub-buffer `e`.
    fn oldest_local(&self, e: usize) -> usize {
        if self.size[e] < self.capacity {
            0
        } else {
            self.cursor[e]
        }
    }

    fn done(&self, ix: usize) -> bool {
        self.is_terminated[ix] != 0 || self.is_truncated[ix] != 0
    }

    /// True when the transition at `ix` was the first of its episode.
    pub fn is_episode_start(&self, ix: usize) -> bool {
        self.assert_written(ix);
        self.ep_start[ix] != 0
    }

    /// Writes a chronological run of transitions into sub-buffer `env_id`,
    /// overwriting the oldest slots once the ring is full.
    ///
    /// `tr` usually holds a single transition (one environment step); runs
    /// longer than the sub-buffer capacity are a contract violation.
    pub fn push(&mut self, env_id: usize, tr: TransitionBatch<O, A>) -> Result<Pushed> {
        assert!(env_id < self.env_num, "env_id {} out of range", env_id);
        let n = tr.len();
        assert!(
            n <= self.capacity,
            "pushing {} transitions into a sub-buffer of capacity {}",
            n,
            self.capacity
        );
        let TransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_terminated,
            is_truncated,
            info,
            ..
        } = tr;

        let mut indices = Vec::with_capacity(n);
        let mut clipped = Vec::with_capacity(n);
        for j in 0..n {
            let local = (self.cursor[env_id] + j) % self.capacity;
            let ix = env_id * self.capacity + local;

            let was_written = local < self.size[env_id];
            clipped.push(was_written && self.ep_start[ix] != 0 && !self.done(ix));

            let starts = if j == 0 {
                match self.last_local(env_id) {
                    None => true,
                    Some(last) => self.done(env_id * self.capacity + last),
                }
            } else {
                is_terminated[j - 1] != 0 || is_truncated[j - 1] != 0
            };

            self.reward[ix] = reward[j];
            self.is_terminated[ix] = is_terminated[j];
            self.is_truncated[ix] = is_truncated[j];
            self.ep_start[ix] = starts as i8;
            indices.push(ix);
        }
        for (&ix, m) in indices.iter().zip(info.into_iter()) {
            self.info[ix] = m;
        }
        self.obs.push(&indices, obs);
        self.act.push(&indices, act);
        self.next_obs.push(&indices, next_obs);

        if let Some(per_state) = &mut self.per_state {
            let max_p = per_state.sum_tree.max_raw();
            for &ix in &indices {
                per_state.sum_tree.add(ix, max_p);
            }
        }

        self.cursor[env_id] = (self.cursor[env_id] + n) % self.capacity;
        self.size[env_id] = (self.size[env_id] + n).min(self.capacity);
        trace!("pushed {} transitions into sub-buffer {}", n, env_id);

        Ok(Pushed {
            indices,
            clipped_episode_start: clipped,
        })
    }

    // Maps a rank in [0, len) onto the rank-th valid absolute index.
    fn nth_valid_index(&self, mut rank: usize) -> usize {
        for e in 0..self.env_num {
            if rank < self.size[e] {
                return e * self.capacity + rank;
            }
            rank -= self.size[e];
        }
        unreachable!("rank out of range");
    }

    /// Samples a batch of transitions.
    ///
    /// Under prioritized replay, indices are drawn proportionally to their
    /// priorities and the batch carries normalized importance weights.
    /// Otherwise sampling is uniform without replacement; when fewer than
    /// `size` transitions are stored it falls back to sampling with
    /// replacement.
    pub fn batch(&mut self, size: usize) -> Result<TransitionBatch<O, A>> {
        let total = self.len();
        if total == 0 {
            return Err(BellmanError::EmptyBuffer.into());
        }

        let (ixs, weight) = if let Some(per_state) = &self.per_state {
            let beta = per_state.iw_scheduler.beta();
            let (ixs, weight) = per_state.sum_tree.sample(size, beta);
            (ixs, Some(weight))
        } else if size <= total {
            let ranks = rand::seq::index::sample(&mut self.rng, total, size).into_vec();
            let ixs = ranks
                .into_iter()
                .map(|r| self.nth_valid_index(r))
                .collect::<Vec<_>>();
            (ixs, None)
        } else {
            warn!(
                "requested batch of {} from a buffer holding {}; sampling with replacement",
                size, total
            );
            let ranks = (0..size)
                .map(|_| (self.rng.next_u32() as usize) % total)
                .collect::<Vec<_>>();
            let ixs = ranks
                .into_iter()
                .map(|r| self.nth_valid_index(r))
                .collect::<Vec<_>>();
            (ixs, None)
        };

        let mut batch = self.select(&ixs);
        batch.weight = weight;
        Ok(batch)
    }

    /// Assembles a batch at explicit absolute indices.
    pub fn select(&self, ixs: &[usize]) -> TransitionBatch<O, A> {
        for &ix in ixs {
            self.assert_written(ix);
        }
        TransitionBatch {
            obs: self.obs.sample(ixs),
            act: self.act.sample(ixs),
            next_obs: self.next_obs.sample(ixs),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
            is_truncated: ixs.iter().map(|&ix| self.is_truncated[ix]).collect(),
            info: ixs.iter().map(|&ix| self.info[ix].clone()).collect(),
            ix_sample: Some(ixs.to_vec()),
            weight: None,
        }
    }

    /// Updates priorities from the TD errors of the last sampled batch and
    /// advances the importance-weight schedule by one optimization step.
    ///
    /// No-op when prioritized replay is not configured.
    pub fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>) {
        if let Some(per_state) = &mut self.per_state {
            let ixs = ixs
                .as_ref()
                .expect("ixs should be Some(_) in update_priority()");
            let td_errs = td_errs
                .as_ref()
                .expect("td_errs should be Some(_) in update_priority()");
            assert_eq!(ixs.len(), td_errs.len());
            for (&ix, &td_err) in ixs.iter().zip(td_errs.iter()) {
                per_state.sum_tree.update(ix, td_err.abs());
            }
            per_state.iw_scheduler.add_n_opts();
        }
    }

    /// Current importance-sampling exponent, when prioritized replay is
    /// configured.
    pub fn beta(&self) -> Option<f32> {
        self.per_state.as_ref().map(|p| p.iw_scheduler.beta())
    }

    /// Number of terminated flags stored in the buffer.
    pub fn num_terminated_flags(&self) -> usize {
        self.is_terminated.iter().map(|&f| f as usize).sum()
    }

    /// Number of truncated flags stored in the buffer.
    pub fn num_truncated_flags(&self) -> usize {
        self.is_truncated.iter().map(|&f| f as usize).sum()
    }

    /// Sum of all stored rewards.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().sum()
    }
}

impl<O, A> TransitionBufferBase for ReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    fn len(&self) -> usize {
        self.size.iter().sum()
    }

    fn reward(&self, ix: usize) -> f32 {
        self.assert_written(ix);
        self.reward[ix]
    }

    fn is_terminated(&self, ix: usize) -> bool {
        self.assert_written(ix);
        self.is_terminated[ix] != 0
    }

    fn is_truncated(&self, ix: usize) -> bool {
        self.assert_written(ix);
        self.is_truncated[ix] != 0
    }

    fn next_index(&self, ix: usize) -> usize {
        self.assert_written(ix);
        let (e, l) = self.locate(ix);
        if l == self.last_local(e).unwrap() {
            ix
        } else {
            e * self.capacity + (l + 1) % self.capacity
        }
    }

    fn prev_index(&self, ix: usize) -> usize {
        self.assert_written(ix);
        let (e, l) = self.locate(ix);
        if l == self.oldest_local(e) {
            ix
        } else {
            e * self.capacity + (l + self.capacity - 1) % self.capacity
        }
    }

    fn unfinished_index(&self) -> Vec<usize> {
        (0..self.env_num)
            .filter_map(|e| {
                self.last_local(e).and_then(|l| {
                    let ix = e * self.capacity + l;
                    (!self.done(ix)).then(|| ix)
                })
            })
            .collect()
    }
}

/// Serializable snapshot of a buffer's contents: one contiguous array per
/// field, cursor and size per sub-buffer, and the raw priority leaves.
///
/// The sampler's RNG is not part of the snapshot; it is reseeded from the
/// configuration on load.
#[derive(Deserialize, Serialize)]
pub struct ReplayBufferState<O, A> {
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    ep_start: Vec<i8>,
    info: Vec<InfoMap>,
    cursor: Vec<usize>,
    size: Vec<usize>,
    priorities: Option<Vec<f32>>,
    n_opts: usize,
}

impl<O, A> ReplayBuffer<O, A>
where
    O: BatchBase + Clone + Serialize + DeserializeOwned,
    A: BatchBase + Clone + Serialize + DeserializeOwned,
{
    /// Captures the buffer's contents as a serializable snapshot.
    pub fn state(&self) -> ReplayBufferState<O, A> {
        ReplayBufferState {
            obs: self.obs.clone(),
            act: self.act.clone(),
            next_obs: self.next_obs.clone(),
            reward: self.reward.clone(),
            is_terminated: self.is_terminated.clone(),
            is_truncated: self.is_truncated.clone(),
            ep_start: self.ep_start.clone(),
            info: self.info.clone(),
            cursor: self.cursor.clone(),
            size: self.size.clone(),
            priorities: self
                .per_state
                .as_ref()
                .map(|p| p.sum_tree.leaves().to_vec()),
            n_opts: self
                .per_state
                .as_ref()
                .map(|p| p.iw_scheduler.n_opts())
                .unwrap_or(0),
        }
    }

    /// Writes the buffer's contents to a binary checkpoint file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, &self.state())?;
        Ok(())
    }

    /// Rebuilds a buffer from a configuration and a checkpoint written by
    /// [`save`](Self::save). The configuration must describe the same
    /// geometry the checkpoint was taken with.
    pub fn load(config: &ReplayBufferConfig, path: impl AsRef<Path>) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        let state: ReplayBufferState<O, A> = bincode::deserialize_from(file)?;
        let mut buffer = Self::build(config)?;

        if state.cursor.len() != buffer.env_num
            || state.size.len() != buffer.env_num
            || state.reward.len() != buffer.slots()
        {
            anyhow::bail!(
                "checkpoint geometry ({} sub-buffers, {} slots) does not match \
                 the configuration ({} sub-buffers, {} slots)",
                state.cursor.len(),
                state.reward.len(),
                buffer.env_num,
                buffer.slots()
            );
        }

        buffer.obs = state.obs;
        buffer.act = state.act;
        buffer.next_obs = state.next_obs;
        buffer.reward = state.reward;
        buffer.is_terminated = state.is_terminated;
        buffer.is_truncated = state.is_truncated;
        buffer.ep_start = state.ep_start;
        buffer.info = state.info;
        buffer.cursor = state.cursor;
        buffer.size = state.size;

        if let Some(per_state) = &mut buffer.per_state {
            let leaves = state
                .priorities
                .ok_or_else(|| anyhow::anyhow!("checkpoint holds no priorities"))?;
            for e in 0..buffer.env_num {
                for l in 0..buffer.size[e] {
                    let ix = e * buffer.capacity + l;
                    per_state.sum_tree.add(ix, leaves[ix]);
                }
            }
            per_state.iw_scheduler.set_n_opts(state.n_opts);
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::PerConfig;

    type Buffer = ReplayBuffer<Vec<f32>, Vec<i32>>;

    fn step(obs: f32, reward: f32, terminated: bool, truncated: bool) -> TransitionBatch<Vec<f32>, Vec<i32>> {
        TransitionBatch::new(
            vec![obs],
            vec![0],
            vec![obs + 1.0],
            vec![reward],
            &[terminated],
            &[truncated],
        )
    }

    fn push_run(buffer: &mut Buffer, env_id: usize, n: usize, done_at: Option<usize>) {
        for k in 0..n {
            let terminated = done_at == Some(k);
            buffer
                .push(env_id, step(k as f32, 1.0, terminated, false))
                .unwrap();
        }
    }

    #[test]
    fn test_wraparound_geometry() {
        let config = ReplayBufferConfig::default().capacity(5).env_num(1);
        let mut buffer = Buffer::build(&config).unwrap();
        for k in 0..7 {
            let pushed = buffer.push(0, step(k as f32, k as f32, false, false)).unwrap();
            assert_eq!(pushed.indices.len(), 1);
        }

        // Slots now hold transitions 5, 6, 2, 3, 4; the 2 oldest are gone.
        assert_eq!(buffer.len(), 5);
        let rewards = (0..5).map(|ix| buffer.reward(ix)).collect::<Vec<_>>();
        assert_eq!(rewards, vec![5.0, 6.0, 2.0, 3.0, 4.0]);

        // Chronological walk from the oldest transition visits 2, 3, 4, 5, 6
        // and then self-loops at the frontier.
        let mut ix = 2;
        let mut seen = vec![buffer.reward(ix)];
        loop {
            let nx = buffer.next_index(ix);
            if nx == ix {
                break;
            }
            ix = nx;
            seen.push(buffer.reward(ix));
        }
        assert_eq!(seen, vec![2.0, 3.0, 4.0, 5.0, 6.0]);

        // And backwards, self-looping at the oldest transition.
        assert_eq!(buffer.prev_index(0), 4);
        assert_eq!(buffer.prev_index(2), 2);
    }

    #[test]
    fn test_next_crosses_episode_boundary() {
        let config = ReplayBufferConfig::default().capacity(8).env_num(1);
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 3, Some(2));
        push_run(&mut buffer, 0, 2, None);

        // The slot after a done index holds the next episode's start; only
        // the flags mark the boundary.
        assert!(buffer.is_terminated(2));
        assert_eq!(buffer.next_index(2), 3);
        assert!(buffer.is_episode_start(3));
        assert!(!buffer.is_episode_start(4));

        // The in-progress episode's tail is the unfinished index.
        assert_eq!(buffer.unfinished_index(), vec![4]);
        assert_eq!(buffer.next_index(4), 4);
    }

    #[test]
    fn test_multi_env_index_spaces() {
        let config = ReplayBufferConfig::default().capacity(4).env_num(2);
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 2, None);
        push_run(&mut buffer, 1, 3, Some(2));

        assert_eq!(buffer.len(), 5);
        // Sub-buffer 1 occupies absolute indices 4..8.
        assert_eq!(buffer.next_index(4), 5);
        assert_eq!(buffer.prev_index(4), 4);
        assert_eq!(buffer.unfinished_index(), vec![1]);

        // Neighbor queries never cross sub-buffers.
        assert_eq!(buffer.next_index(1), 1);
        assert_eq!(buffer.next_index(6), 6);
    }

    #[test]
    #[should_panic(expected = "has not been written")]
    fn test_unwritten_index_panics() {
        let config = ReplayBufferConfig::default().capacity(4).env_num(1);
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 2, None);
        buffer.reward(3);
    }

    #[test]
    fn test_clipped_episode_start_flag() {
        let config = ReplayBufferConfig::default().capacity(4).env_num(1);
        let mut buffer = Buffer::build(&config).unwrap();
        // Episode of 2, then an episode that is still running.
        push_run(&mut buffer, 0, 2, Some(1));
        push_run(&mut buffer, 0, 2, None);

        // Wrapping overwrites slot 0, the first episode's start.
        let pushed = buffer.push(0, step(9.0, 0.0, false, false)).unwrap();
        assert_eq!(pushed.clipped_episode_start, vec![true]);

        // Slot 1 ended that episode, so removing it clips nothing.
        let pushed = buffer.push(0, step(10.0, 0.0, false, false)).unwrap();
        assert_eq!(pushed.clipped_episode_start, vec![false]);
    }

    #[test]
    fn test_flag_and_reward_tallies() {
        let config = ReplayBufferConfig::default().capacity(4).env_num(2);
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 4, Some(1));
        push_run(&mut buffer, 1, 2, None);
        buffer.push(1, step(5.0, 3.0, false, true)).unwrap();

        assert_eq!(buffer.num_terminated_flags(), 1);
        assert_eq!(buffer.num_truncated_flags(), 1);
        assert!((buffer.sum_rewards() - 9.0).abs() < 1e-6);

        // Overwriting the terminated step removes it from the tallies.
        push_run(&mut buffer, 0, 2, None);
        assert_eq!(buffer.num_terminated_flags(), 0);
        assert_eq!(buffer.num_truncated_flags(), 1);
    }

    #[test]
    fn test_uniform_sampling_without_replacement() {
        let config = ReplayBufferConfig::default().capacity(16).env_num(2).seed(1);
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 10, None);
        push_run(&mut buffer, 1, 6, None);

        let batch = buffer.batch(16).unwrap();
        let mut ixs = batch.ix_sample.clone().unwrap();
        ixs.sort_unstable();
        ixs.dedup();
        assert_eq!(ixs.len(), 16, "a full-coverage batch has no duplicates");
        assert!(batch.weight.is_none());

        assert!(Buffer::build(&config).unwrap().batch(4).is_err());
    }

    #[test]
    fn test_prioritized_sampling_concentrates() {
        fastrand::seed(3);
        let config = ReplayBufferConfig::default()
            .capacity(8)
            .env_num(1)
            .per_config(Some(PerConfig::default().alpha(1.0)));
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 8, None);

        // Zero every priority except index 5.
        let ixs = (0..8).collect::<Vec<_>>();
        let errs = ixs
            .iter()
            .map(|&ix| if ix == 5 { 1.0 } else { 0.0 })
            .collect::<Vec<f32>>();
        buffer.update_priority(&Some(ixs), &Some(errs));

        let batch = buffer.batch(64).unwrap();
        assert!(batch
            .ix_sample
            .unwrap()
            .iter()
            .all(|&ix| ix == 5));
        let weight = batch.weight.unwrap();
        assert!(weight.iter().all(|&w| (w - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_priority_reset_on_overwrite() {
        fastrand::seed(5);
        let config = ReplayBufferConfig::default()
            .capacity(4)
            .env_num(1)
            .per_config(Some(PerConfig::default().alpha(1.0)));
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 4, None);

        // Demote every stored transition, then overwrite slot 0; the fresh
        // transition re-enters at the maximum priority and dominates.
        let ixs = (0..4).collect::<Vec<_>>();
        buffer.update_priority(&Some(ixs), &Some(vec![1e-3; 4]));
        buffer.push(0, step(42.0, 0.0, false, false)).unwrap();

        let batch = buffer.batch(64).unwrap();
        let hits = batch
            .ix_sample
            .unwrap()
            .iter()
            .filter(|&&ix| ix == 0)
            .count();
        assert!(hits > 48, "fresh transition sampled {} of 64", hits);
    }

    #[test]
    fn test_beta_advances_with_updates() {
        let config = ReplayBufferConfig::default()
            .capacity(4)
            .env_num(1)
            .per_config(Some(
                PerConfig::default().beta_0(0.4).beta_final(1.0).n_opts_final(3),
            ));
        let mut buffer = Buffer::build(&config).unwrap();
        push_run(&mut buffer, 0, 4, None);

        assert!((buffer.beta().unwrap() - 0.4).abs() < 1e-6);
        for _ in 0..3 {
            buffer.update_priority(&Some(vec![0]), &Some(vec![0.5]));
        }
        assert!((buffer.beta().unwrap() - 1.0).abs() < 1e-6);
    }
}
