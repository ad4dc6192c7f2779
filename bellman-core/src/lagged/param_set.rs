//! Named parameter arrays of one model.
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The parameters of one model, identified by name.
///
/// This is the whole interface between this crate and whatever builds and
/// differentiates networks: a model exports its parameters as named float
/// arrays, and imports them back after synchronization.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ParamSet {
    params: HashMap<String, ArrayD<f32>>,
}

impl ParamSet {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the parameter array `name`.
    pub fn insert(&mut self, name: impl Into<String>, param: ArrayD<f32>) {
        self.params.insert(name.into(), param);
    }

    /// The parameter array `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.params.get(name)
    }

    /// Number of parameter arrays.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True when the set holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over `(name, array)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArrayD<f32>)> {
        self.params.iter()
    }

    /// True when `other` has exactly the same parameter names and shapes.
    pub fn architecture_matches(&self, other: &ParamSet) -> bool {
        self.params.len() == other.params.len()
            && self.params.iter().all(|(name, param)| {
                other
                    .params
                    .get(name)
                    .map_or(false, |o| o.shape() == param.shape())
            })
    }

    /// Overwrites every parameter with the matching one from `src`.
    pub fn copy_from(&mut self, src: &ParamSet) {
        assert!(
            self.architecture_matches(src),
            "parameter sets have mismatched architectures"
        );
        for (name, dest) in self.params.iter_mut() {
            dest.assign(&src.params[name]);
        }
    }

    /// Moves every parameter towards the matching one from `src`:
    /// `self = tau * src + (1 - tau) * self`.
    pub fn lerp_from(&mut self, src: &ParamSet, tau: f32) {
        assert!(
            self.architecture_matches(src),
            "parameter sets have mismatched architectures"
        );
        for (name, dest) in self.params.iter_mut() {
            dest.zip_mut_with(&src.params[name], |d, s| {
                *d = tau * s + (1.0 - tau) * *d;
            });
        }
    }
}

impl FromIterator<(String, ArrayD<f32>)> for ParamSet {
    fn from_iter<T: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: T) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
