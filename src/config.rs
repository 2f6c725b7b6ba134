//! Build-time configuration.

use crate::error::{Result, VPTreeError};

/// How the vantage point of each internal node is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VantageSelection {
    /// Uniformly at random among the remaining items. Keeps the tree
    /// balanced on clustered or adversarially ordered input.
    Randomized,
    /// Always the first remaining item, in the order the builder holds
    /// them. Reproduces the fixed tree shape of first-item pivoting.
    First,
}

impl Default for VantageSelection {
    fn default() -> Self {
        VantageSelection::Randomized
    }
}

/// Parameters for [`VPTree::build`](crate::VPTree::build) and
/// [`VPTree::build_parallel`](crate::VPTree::build_parallel).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Subsets of at most this many items become leaves instead of
    /// being split further. Must be at least 1.
    pub leaf_size: usize,
    pub vantage: VantageSelection,
    /// Seed for the random source. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            leaf_size: 1,
            vantage: VantageSelection::default(),
            seed: None,
        }
    }
}

impl BuildConfig {
    pub fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn vantage(mut self, vantage: VantageSelection) -> Self {
        self.vantage = vantage;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(VPTreeError::InvalidConfig("leaf_size must be at least 1".to_string()));
        }
        Ok(())
    }
}
