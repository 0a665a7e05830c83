//! k-means++ seeding.
//!
//! 1. Choose the first centroid uniformly at random among all samples.
//! 2. For every sample not chosen yet, compute D(x)², the squared distance to
//!    its nearest chosen centroid.
//! 3. Draw the next centroid with probability proportional to D(x)².
//! 4. Repeat until k centroids have been chosen.

use rand::Rng;
use tracing::debug;

use crate::cluster::Cluster;
use crate::corpus::Corpus;
use crate::error::{ClusterError, Result};
use crate::vector::VectorLike;

/// Checks `1 <= k <= corpus_len` before any sampling starts.
///
/// # Errors
/// [`ClusterError::EmptyCorpus`], [`ClusterError::InvalidParameter`] for
/// `k == 0`, or [`ClusterError::InvalidClusterCount`] for `k > corpus_len`.
pub fn validate_cluster_count(corpus_len: usize, k: usize) -> Result<()> {
    if corpus_len == 0 {
        return Err(ClusterError::EmptyCorpus);
    }
    if k == 0 {
        return Err(ClusterError::InvalidParameter {
            name: "k",
            message: "must be at least 1",
        });
    }
    if k > corpus_len {
        return Err(ClusterError::InvalidClusterCount {
            requested: k,
            samples: corpus_len,
        });
    }
    Ok(())
}

/// Chooses `k` initial centroids with k-means++.
///
/// Every returned cluster borrows its centroid directly from `corpus` and has
/// no members. Centroids are pairwise distinct corpus indices.
///
/// # Errors
/// See [`validate_cluster_count`]; accessor errors are propagated.
pub fn seed_clusters<'a, C, R>(
    corpus: &'a C,
    k: usize,
    rng: &mut R,
) -> Result<Vec<Cluster<'a, C::Sample>>>
where
    C: Corpus,
    R: Rng,
{
    let n = corpus.len();
    validate_cluster_count(n, k)?;

    let mut chosen = vec![false; n];
    let mut clusters: Vec<Cluster<'a, C::Sample>> = Vec::with_capacity(k);

    for cluster_id in 0..k {
        let index = if cluster_id == 0 {
            rng.random_range(0..n)
        } else {
            let mut candidates = Vec::with_capacity(n - cluster_id);
            for (index, _) in chosen.iter().enumerate().filter(|(_, taken)| !**taken) {
                let sample = corpus.sample(index)?;
                let nearest = clusters
                    .iter()
                    .map(|c| sample.distance_from(c.centroid()))
                    .fold(f64::INFINITY, f64::min);
                candidates.push((index, nearest));
            }
            draw_weighted(&candidates, rng).ok_or(ClusterError::InvalidClusterCount {
                requested: k,
                samples: n,
            })?
        };

        let sample = corpus.sample(index)?;
        chosen[index] = true;
        debug!(
            cluster_id,
            sample_index = index,
            sample_id = sample.id(),
            "k-means++ centroid chosen"
        );
        clusters.push(Cluster::seeded(cluster_id, sample));
    }

    Ok(clusters)
}

/// Picks the first candidate whose cumulative probability exceeds a uniform
/// draw in `[0, 1)`.
///
/// Falls back to a uniform pick when every weight is zero, i.e. all remaining
/// candidates coincide with chosen centroids.
fn draw_weighted<R: Rng>(candidates: &[(usize, f64)], rng: &mut R) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }

    let total: f64 = candidates.iter().map(|&(_, weight)| weight).sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(candidates[rng.random_range(0..candidates.len())].0);
    }

    let draw: f64 = rng.random();
    let mut cumulative = 0.0;
    for &(index, weight) in candidates {
        cumulative += weight;
        if cumulative / total > draw {
            return Some(index);
        }
    }
    // rounding can leave the final cumulative value just below the draw
    candidates.last().map(|&(index, _)| index)
}
