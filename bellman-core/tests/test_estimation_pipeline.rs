//! Return estimation driven through a real vectorized replay buffer.
use anyhow::Result;
use bellman_core::{
    replay_buffer::{ReplayBuffer, ReplayBufferConfig, TransitionBatch},
    returns::{Gae, GaeConfig, NStepReturn, NStepReturnConfig},
    util::chunks,
    TransitionBufferBase,
};

type Buffer = ReplayBuffer<Vec<f32>, Vec<i32>>;

const GAMMA: f32 = 0.9;

fn step(
    obs: f32,
    reward: f32,
    terminated: bool,
    truncated: bool,
) -> TransitionBatch<Vec<f32>, Vec<i32>> {
    TransitionBatch::new(
        vec![obs],
        vec![0],
        vec![obs + 1.0],
        vec![reward],
        &[terminated],
        &[truncated],
    )
}

/// Two sub-buffers:
///   env 0: a 3-step terminated episode, then 2 steps still in progress
///   env 1: a 4-step episode cut off by truncation
/// Observations are `100 * env + k`, so value functions built on them are
/// easy to predict in the assertions below.
fn collect() -> Buffer {
    let config = ReplayBufferConfig::default().capacity(8).env_num(2);
    let mut buffer = Buffer::build(&config).unwrap();
    for k in 0..5 {
        let terminated = k == 2;
        buffer
            .push(0, step(k as f32, 1.0, terminated, false))
            .unwrap();
    }
    for k in 0..4 {
        let truncated = k == 3;
        buffer
            .push(1, step(100.0 + k as f32, 2.0, false, truncated))
            .unwrap();
    }
    buffer
}

// V(next observation stored at ix) = that next observation itself.
fn next_obs_value(buffer: &Buffer, ixs: &[usize]) -> Result<Vec<f32>> {
    Ok(buffer.select(ixs).next_obs)
}

#[test]
fn test_nstep_walks_respect_interleaved_episodes() {
    let buffer = collect();
    let mut est =
        NStepReturn::build(&NStepReturnConfig::default().gamma(GAMMA).n_step(2)).unwrap();

    // Env 0 absolute indices are 0..5, env 1 occupies 8..12.
    let returns = est
        .compute(&buffer, &[0, 1, 2, 8, 10], &next_obs_value)
        .unwrap();

    // Two full steps, then bootstrap from the next observation of index 1.
    assert!((returns[0] - (1.0 + GAMMA + GAMMA * GAMMA * 2.0)).abs() < 1e-4);
    // The walk from index 1 reaches the terminated step: no bootstrap.
    assert!((returns[1] - (1.0 + GAMMA)).abs() < 1e-4);
    assert!((returns[2] - 1.0).abs() < 1e-4);
    // Env 1 walks never leave env 1's ring.
    assert!((returns[3] - (2.0 + GAMMA * 2.0 + GAMMA * GAMMA * 102.0)).abs() < 1e-4);
    // The truncated cutoff still bootstraps from its next observation.
    assert!((returns[4] - (2.0 + GAMMA * 2.0 + GAMMA * GAMMA * 104.0)).abs() < 1e-4);
}

#[test]
fn test_gae_over_whole_buffer_in_env_major_order() {
    let buffer = collect();
    let mut est = Gae::build(
        &GaeConfig::default()
            .gamma(GAMMA)
            .gae_lambda(1.0)
            .max_batchsize(4),
    )
    .unwrap();

    // On-policy preprocessing order: each sub-buffer's indices
    // chronologically, sub-buffers concatenated.
    let indices = vec![0usize, 1, 2, 3, 4, 8, 9, 10, 11];

    // The caller evaluates values in bounded chunks.
    let mut v_s = Vec::new();
    let mut v_s_ = Vec::new();
    for r in chunks(indices.len(), est.max_batchsize()) {
        let chunk = &indices[r];
        let b = buffer.select(chunk);
        v_s.extend(b.obs.iter().map(|o| o * 0.01));
        v_s_.extend(b.next_obs.iter().map(|o| o * 0.01));
    }

    let (returns, adv) = est
        .compute(&buffer, &indices, &v_s, &v_s_)
        .unwrap();
    assert_eq!(returns.len(), indices.len());

    // Lambda = 1: the advantage at each position is the discounted sum of
    // rewards to its episode boundary, plus the boundary's bootstrap,
    // minus the baseline. Position 2 ends a terminated episode.
    assert!((adv[2] - (1.0 - v_s[2])).abs() < 1e-4);
    assert!((adv[1] - (1.0 + GAMMA - v_s[1])).abs() < 1e-4);

    // Position 4 is env 0's write frontier; its successor in the batch is
    // env 1's data, and nothing of env 1 leaks into it.
    let expected_frontier = 1.0 + GAMMA * v_s_[4] - v_s[4];
    assert!((adv[4] - expected_frontier).abs() < 1e-4);

    // Env 1's truncated tail bootstraps from its own next observation.
    let expected_tail = 2.0 + GAMMA * v_s_[8] - v_s[8];
    assert!((adv[8] - expected_tail).abs() < 1e-4);
}

#[test]
fn test_unfinished_frontiers_per_sub_buffer() {
    let buffer = collect();
    // Env 0 is mid-episode at absolute index 4; env 1's last write is
    // truncated, so only env 0 reports an unfinished tail.
    assert_eq!(buffer.unfinished_index(), vec![4]);
}
