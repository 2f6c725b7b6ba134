//! Error types for tree construction and search.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VPTreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VPTreeError {
    #[error("cannot build a vantage point tree from zero items")]
    EmptyInput,

    #[error("cannot query a vantage point tree that holds no items")]
    EmptyTree,

    /// The metric returned NaN, a negative, or an infinite distance.
    /// `item` is the index of the indexed item involved in the comparison.
    #[error("metric returned invalid distance {distance} for item {item}")]
    InvalidDistance { item: usize, distance: f64 },

    #[error("invalid build configuration: {0}")]
    InvalidConfig(String),
}
