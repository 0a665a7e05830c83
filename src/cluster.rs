//! A cluster generation: id, centroid and borrowed members.

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::kmeans::Geometry;
use crate::vector::{SampleId, VectorLike};

/// One cluster of a generation.
///
/// Seeded centroids borrow their corpus sample; every recomputed centroid is a
/// distinct owned value built from [`VectorLike::zero`], so a centroid never
/// aliases a corpus sample after the first update. Members always borrow from
/// the corpus.
#[derive(Debug, Clone)]
pub struct Cluster<'a, S: VectorLike> {
    id: usize,
    centroid: Cow<'a, S>,
    members: Vec<&'a S>,
}

impl<'a, S: VectorLike> Cluster<'a, S> {
    /// A cluster with a corpus sample as centroid and no members.
    #[must_use]
    pub fn seeded(id: usize, centroid: &'a S) -> Self {
        Self {
            id,
            centroid: Cow::Borrowed(centroid),
            members: Vec::new(),
        }
    }

    /// Same id and centroid, empty membership.
    #[must_use]
    pub fn next_generation(&self) -> Self {
        Self {
            id: self.id,
            centroid: self.centroid.clone(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn centroid(&self) -> &S {
        &self.centroid
    }

    /// Whether the centroid is still a borrowed corpus sample.
    #[must_use]
    pub fn centroid_is_borrowed(&self) -> bool {
        matches!(self.centroid, Cow::Borrowed(_))
    }

    #[must_use]
    pub fn members(&self) -> &[&'a S] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = SampleId> + '_ {
        self.members.iter().map(|m| m.id())
    }

    pub(crate) fn push(&mut self, sample: &'a S) {
        self.members.push(sample);
    }

    /// Whether both clusters hold the same set of sample identities.
    #[must_use]
    pub fn same_membership(&self, other: &Cluster<'_, S>) -> bool {
        if self.members.len() != other.members.len() {
            return false;
        }
        let mine: FxHashSet<SampleId> = self.member_ids().collect();
        let theirs: FxHashSet<SampleId> = other.member_ids().collect();
        mine == theirs
    }

    /// Replaces the centroid with the mean of the members, renormalized to
    /// unit norm under [`Geometry::Spherical`].
    ///
    /// Returns `Ok(false)` when the cluster has no members. The previous
    /// centroid value is kept, detached from the corpus as an owned copy.
    pub(crate) fn recalculate_centroid(&mut self, geometry: Geometry) -> Result<bool> {
        if self.members.is_empty() {
            self.centroid.to_mut();
            return Ok(false);
        }

        let mut mean = self.centroid.zero();
        for member in &self.members {
            mean.add(member);
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.members.len() as f64;
        mean.scalar_multiply(1.0 / count);
        if geometry == Geometry::Spherical {
            mean.normalize()?;
        }

        self.centroid = Cow::Owned(mean);
        Ok(true)
    }
}

impl<S: VectorLike> fmt::Display for Cluster<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id: {}, Members:", self.id)?;
        for id in self.member_ids() {
            write!(f, " {id}")?;
        }
        Ok(())
    }
}
