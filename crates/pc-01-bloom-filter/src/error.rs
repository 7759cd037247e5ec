//! Error types for the Bloom filter crate

use thiserror::Error;

/// Errors raised while constructing a filter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid filter parameter: {reason}")]
    InvalidParameter { reason: String },
}

/// Errors raised by the estimators
///
/// Both variants are caller errors: the call is rejected and nothing else is
/// affected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("Degenerate filter: {reason}")]
    DegenerateFilter { reason: String },

    #[error("Incompatible filters: ({left_size}, {left_hashes}) vs ({right_size}, {right_hashes})")]
    IncompatibleFilters {
        left_size: usize,
        left_hashes: usize,
        right_size: usize,
        right_hashes: usize,
    },
}

impl EstimatorError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateFilter {
            reason: reason.into(),
        }
    }
}
