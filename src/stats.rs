//! Cohesion and separation statistics over finished clusters.
//!
//! All functions are read-only and only used for reporting.

use serde::Serialize;

use crate::cluster::Cluster;
use crate::vector::VectorLike;

/// Mean and population standard deviation of a set of cosine similarities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityStats {
    pub mean: f64,
    pub std_dev: f64,
    pub pairs: usize,
}

impl SimilarityStats {
    /// `None` for an empty sample.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            pairs: values.len(),
        })
    }
}

/// Cosine similarity over every unordered pair of distinct members.
///
/// `None` when the cluster has fewer than two members.
#[must_use]
pub fn pairwise_cosine_stats<S: VectorLike>(cluster: &Cluster<'_, S>) -> Option<SimilarityStats> {
    let members = cluster.members();
    let mut sims = Vec::with_capacity(members.len() * members.len().saturating_sub(1) / 2);
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            sims.push(a.cosine_similarity(b));
        }
    }
    SimilarityStats::from_values(&sims)
}

/// Cosine similarity over the full cross product of two clusters' members.
///
/// `None` when either cluster is empty.
#[must_use]
pub fn inter_cluster_cosine_stats<S: VectorLike>(
    a: &Cluster<'_, S>,
    b: &Cluster<'_, S>,
) -> Option<SimilarityStats> {
    let mut sims = Vec::with_capacity(a.len() * b.len());
    for x in a.members() {
        for y in b.members() {
            sims.push(x.cosine_similarity(y));
        }
    }
    SimilarityStats::from_values(&sims)
}

/// Mean cosine similarity between the centroid and each member; 0.0 when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cluster_quality<S: VectorLike>(cluster: &Cluster<'_, S>) -> f64 {
    if cluster.is_empty() {
        return 0.0;
    }
    let centroid = cluster.centroid();
    let total: f64 = cluster
        .members()
        .iter()
        .map(|m| centroid.cosine_similarity(m))
        .sum();
    total / cluster.len() as f64
}
