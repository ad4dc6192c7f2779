//! Registration and synchronization of (source, shadow) parameter pairs.
use super::ParamSet;
use crate::error::BellmanError;
use anyhow::Result;
use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    rc::Rc,
};

/// Shared handle to a model's parameters.
///
/// The algorithm mutates the source through its handle after every gradient
/// step; the manager reads it during synchronization. Single-threaded by
/// design, like everything in this crate.
pub type SharedParams = Rc<RefCell<ParamSet>>;

/// Synchronization discipline applied to every tracked pair.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub enum SyncRule {
    /// Overwrite the shadow with the source, parameter for parameter.
    /// Callers with a `target_update_freq` invoke [`sync`] once every
    /// `target_update_freq` optimizer steps, from their own step counter.
    ///
    /// [`sync`]: LaggedNetworkManager::sync
    Full,

    /// Exponential moving average `shadow = tau * source + (1 - tau) *
    /// shadow`, applied every optimizer step. `tau = 1` degenerates to a
    /// full copy.
    Polyak {
        /// Smoothing constant in `(0, 1]`.
        tau: f32,
    },
}

struct LaggedPair {
    source: SharedParams,
    shadow: SharedParams,
}

/// Owner of the lagged copies of a set of models.
///
/// All registered pairs are synchronized by the same rule in one
/// [`sync`](Self::sync) call, so paired shadows (an actor's and a critic's,
/// say) never drift out of step with each other. The shadows hold plain
/// arrays: no gradient flows into them and nothing here belongs in an
/// optimizer's parameter list.
pub struct LaggedNetworkManager {
    rule: SyncRule,
    pairs: Vec<LaggedPair>,
}

impl LaggedNetworkManager {
    /// Creates a manager, validating the rule.
    pub fn build(rule: SyncRule) -> Result<Self> {
        if let SyncRule::Polyak { tau } = rule {
            if !(tau > 0.0 && tau <= 1.0) {
                return Err(BellmanError::InvalidTau(tau).into());
            }
        }
        Ok(Self {
            rule,
            pairs: Vec::new(),
        })
    }

    /// The configured synchronization rule.
    pub fn rule(&self) -> SyncRule {
        self.rule
    }

    /// Registers `source` and returns a fresh shadow: a deep copy with
    /// identical architecture and initial values.
    ///
    /// The shadow is only ever mutated by [`sync`](Self::sync); the caller
    /// reads it to compute bootstrap targets.
    pub fn track(&mut self, source: &SharedParams) -> SharedParams {
        let shadow = Rc::new(RefCell::new(source.borrow().clone()));
        self.pairs.push(LaggedPair {
            source: source.clone(),
            shadow: shadow.clone(),
        });
        shadow
    }

    /// Registers an existing (source, shadow) pair.
    ///
    /// Panics when the architectures differ: pairing mismatched models is a
    /// caller bug, not a recoverable condition.
    pub fn track_pair(&mut self, source: &SharedParams, shadow: &SharedParams) {
        assert!(
            source.borrow().architecture_matches(&shadow.borrow()),
            "source and shadow have mismatched architectures"
        );
        self.pairs.push(LaggedPair {
            source: source.clone(),
            shadow: shadow.clone(),
        });
    }

    /// Number of tracked pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pair is tracked.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Applies the rule to every tracked pair.
    ///
    /// Callers invoke this at a fixed point relative to the gradient step,
    /// before reading any target values, never in the middle of a target
    /// computation.
    pub fn sync(&mut self) {
        trace!("synchronizing {} lagged pairs", self.pairs.len());
        for pair in &self.pairs {
            let source = pair.source.borrow();
            let mut shadow = pair.shadow.borrow_mut();
            match self.rule {
                SyncRule::Full => shadow.copy_from(&source),
                SyncRule::Polyak { tau } => shadow.lerp_from(&source, tau),
            }
        }
    }

    /// Writes the shadow parameter sets to a binary checkpoint file.
    ///
    /// Only the shadows are persisted; the rule is configuration and the
    /// sources belong to the algorithm.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let shadows = self
            .pairs
            .iter()
            .map(|p| p.shadow.borrow().clone())
            .collect::<Vec<_>>();
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, &shadows)?;
        Ok(())
    }

    /// Restores the shadow parameter sets from a checkpoint written by
    /// [`save`](Self::save), in registration order.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = BufReader::new(File::open(path)?);
        let shadows: Vec<ParamSet> = bincode::deserialize_from(file)?;
        if shadows.len() != self.pairs.len() {
            anyhow::bail!(
                "checkpoint holds {} shadows but {} pairs are tracked",
                shadows.len(),
                self.pairs.len()
            );
        }
        for (pair, restored) in self.pairs.iter().zip(shadows.into_iter()) {
            if !pair.shadow.borrow().architecture_matches(&restored) {
                anyhow::bail!("checkpoint shadow does not match the tracked architecture");
            }
            *pair.shadow.borrow_mut() = restored;
        }
        Ok(())
    }
}
