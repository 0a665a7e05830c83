//! Error types for the clustering engine.

use thiserror::Error;

use crate::vector::SampleId;

/// Result alias used across the clustering engine.
pub type Result<T, E = ClusterError> = std::result::Result<T, E>;

/// Errors surfaced by seeding, the Lloyd loop and vector operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// A tuning parameter was out of its valid range.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    /// The requested cluster count cannot be satisfied by the corpus.
    #[error("cannot create {requested} clusters from {samples} samples")]
    InvalidClusterCount { requested: usize, samples: usize },

    /// The corpus contains no samples.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// A corpus accessor was called outside `[0, len)`.
    #[error("sample index {index} out of range for corpus of size {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// `normalize()` was called on an all-zero vector.
    #[error("cannot normalize zero vector (sample {id})")]
    DegenerateNormalization { id: SampleId },

    /// A cluster lost every member and the policy forbids keeping its centroid.
    #[error("cluster {cluster_id} has no members after iteration {iteration}")]
    EmptyCluster { cluster_id: usize, iteration: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = ClusterError::InvalidClusterCount {
            requested: 5,
            samples: 3,
        };
        assert_eq!(err.to_string(), "cannot create 5 clusters from 3 samples");

        let err = ClusterError::IndexOutOfRange { index: 7, len: 2 };
        assert!(err.to_string().contains("index 7"));
    }
}
