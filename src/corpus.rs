//! Read access to the samples being clustered.

use crate::error::{ClusterError, Result};
use crate::vector::VectorLike;

/// Indexed, fixed-size collection of samples.
///
/// Repeated calls to [`Corpus::sample`] with the same index must return the
/// same underlying sample; the Lloyd loop relies on identity stability across
/// assignment passes.
pub trait Corpus {
    type Sample: VectorLike;

    /// Number of samples, stable for the duration of a clustering run.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sample at `index`.
    ///
    /// # Errors
    /// [`ClusterError::IndexOutOfRange`] when `index >= len()`.
    fn sample(&self, index: usize) -> Result<&Self::Sample>;
}

/// Corpus whose samples can be rewritten in place (spherical pre-normalization).
pub trait CorpusMut: Corpus {
    /// # Errors
    /// [`ClusterError::IndexOutOfRange`] when `index >= len()`.
    fn sample_mut(&mut self, index: usize) -> Result<&mut Self::Sample>;
}

/// In-memory corpus backed by a `Vec`.
#[derive(Debug, Clone, Default)]
pub struct VecCorpus<S> {
    samples: Vec<S>,
}

impl<S> VecCorpus<S> {
    #[must_use]
    pub fn new(samples: Vec<S>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: S) {
        self.samples.push(sample);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[S] {
        &self.samples
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<S> {
        self.samples
    }
}

impl<S> From<Vec<S>> for VecCorpus<S> {
    fn from(samples: Vec<S>) -> Self {
        Self::new(samples)
    }
}

impl<S> FromIterator<S> for VecCorpus<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<S: VectorLike> Corpus for VecCorpus<S> {
    type Sample = S;

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize) -> Result<&S> {
        let len = self.samples.len();
        self.samples
            .get(index)
            .ok_or(ClusterError::IndexOutOfRange { index, len })
    }
}

impl<S: VectorLike> CorpusMut for VecCorpus<S> {
    fn sample_mut(&mut self, index: usize) -> Result<&mut S> {
        let len = self.samples.len();
        self.samples
            .get_mut(index)
            .ok_or(ClusterError::IndexOutOfRange { index, len })
    }
}

/// Normalizes every sample of `corpus` to unit norm.
///
/// # Errors
/// Propagates [`ClusterError::DegenerateNormalization`] from the first zero
/// vector encountered.
pub fn normalize_all<C: CorpusMut>(corpus: &mut C) -> Result<()> {
    for index in 0..corpus.len() {
        corpus.sample_mut(index)?.normalize()?;
    }
    Ok(())
}
