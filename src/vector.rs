//! Capability set every clusterable sample implements.
//!
//! The Lloyd loop and the k-means++ seeder only talk to samples through
//! [`VectorLike`], so the same control flow serves both the Euclidean and the
//! spherical geometry.

use crate::error::Result;

/// Stable identity of a sample inside a corpus.
pub type SampleId = i64;

/// Vector-like sample used both as clustering input and as a centroid.
///
/// Equality between samples is identity based (see [`VectorLike::id`]) and is
/// only used for membership comparisons, never for numeric equivalence.
pub trait VectorLike: Clone {
    /// Identity of the sample.
    fn id(&self) -> SampleId;

    /// Whether two samples share the same identity.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Squared Euclidean distance over the union of supported coordinates.
    fn distance_from(&self, other: &Self) -> f64;

    /// Cosine similarity. Returns 0.0 when either operand has zero norm.
    fn cosine_similarity(&self, other: &Self) -> f64;

    /// Euclidean norm.
    fn norm(&self) -> f64;

    /// A fresh additive identity of the same concrete type.
    #[must_use]
    fn zero(&self) -> Self;

    /// Pointwise in-place accumulation.
    fn add(&mut self, other: &Self);

    /// Pointwise in-place scaling.
    fn scalar_multiply(&mut self, factor: f64);

    /// Scales the vector to unit norm.
    ///
    /// # Errors
    /// Returns [`crate::ClusterError::DegenerateNormalization`] for a zero vector.
    fn normalize(&mut self) -> Result<()>;
}
