//! Lloyd iteration over k-means++ seeds, in Euclidean or spherical geometry.
//!
//! Each iteration builds a new generation of clusters (same ids and centroids,
//! empty membership), assigns every sample to its nearest centroid, recomputes
//! the centroids and compares the memberships of the two generations. The run
//! stops when every cluster kept exactly the same members, or when the
//! iteration cap is reached.
//!
//! In spherical mode all samples are normalized to unit norm up front,
//! "nearest" means maximum cosine similarity, and recomputed centroids are
//! renormalized.

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cluster::Cluster;
use crate::corpus::{Corpus, CorpusMut, normalize_all};
use crate::error::{ClusterError, Result};
use crate::seeding::{seed_clusters, validate_cluster_count};
use crate::vector::VectorLike;

/// Default cap on Lloyd iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Geometry used for assignment and centroid updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    /// Minimum squared distance, plain mean centroids.
    Euclidean,
    /// Maximum cosine similarity, unit-norm mean centroids.
    #[default]
    Spherical,
}

/// What to do when a cluster ends an assignment pass without members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyClusterPolicy {
    /// Keep the previous centroid and continue.
    #[default]
    KeepCentroid,
    /// Abort the run with [`ClusterError::EmptyCluster`].
    Fail,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Convergence {
    /// Membership was stable after `iterations` passes.
    Converged { iterations: usize },
    /// Membership was still changing when the cap was hit.
    IterationLimit { iterations: usize },
}

impl Convergence {
    #[must_use]
    pub fn iterations(self) -> usize {
        match self {
            Self::Converged { iterations } | Self::IterationLimit { iterations } => iterations,
        }
    }
}

/// Final cluster generation of a run.
#[derive(Debug, Clone)]
pub struct Clustering<'a, S: VectorLike> {
    clusters: Vec<Cluster<'a, S>>,
    convergence: Convergence,
    geometry: Geometry,
}

impl<'a, S: VectorLike> Clustering<'a, S> {
    #[must_use]
    pub fn clusters(&self) -> &[Cluster<'a, S>] {
        &self.clusters
    }

    #[must_use]
    pub fn into_clusters(self) -> Vec<Cluster<'a, S>> {
        self.clusters
    }

    #[must_use]
    pub fn convergence(&self) -> Convergence {
        self.convergence
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self.convergence, Convergence::Converged { .. })
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
}

/// k-means++ seeded Lloyd clustering.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    geometry: Geometry,
    max_iterations: usize,
    empty_cluster_policy: EmptyClusterPolicy,
}

impl KMeans {
    /// Euclidean k-means with `k` clusters and default settings.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            geometry: Geometry::Euclidean,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            empty_cluster_policy: EmptyClusterPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    #[must_use]
    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy {
        self.empty_cluster_policy
    }

    /// Clusters `corpus`, normalizing its samples first in spherical mode.
    ///
    /// # Errors
    /// Invalid `k` or iteration cap, zero vectors in spherical mode, accessor
    /// failures, and empty clusters under [`EmptyClusterPolicy::Fail`].
    pub fn fit<'a, C, R>(
        &self,
        corpus: &'a mut C,
        rng: &mut R,
    ) -> Result<Clustering<'a, C::Sample>>
    where
        C: CorpusMut,
        R: Rng,
    {
        self.validate(corpus.len())?;
        if self.geometry == Geometry::Spherical {
            normalize_all(corpus)?;
        }
        let corpus: &'a C = corpus;
        self.run(corpus, rng)
    }

    /// Clusters a corpus that is already prepared for the configured geometry.
    ///
    /// Spherical mode expects every sample to have unit norm already.
    ///
    /// # Errors
    /// Same as [`KMeans::fit`], minus normalization failures of the corpus.
    pub fn fit_prepared<'a, C, R>(
        &self,
        corpus: &'a C,
        rng: &mut R,
    ) -> Result<Clustering<'a, C::Sample>>
    where
        C: Corpus,
        R: Rng,
    {
        self.validate(corpus.len())?;
        self.run(corpus, rng)
    }

    fn validate(&self, corpus_len: usize) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        validate_cluster_count(corpus_len, self.k)
    }

    fn run<'a, C, R>(&self, corpus: &'a C, rng: &mut R) -> Result<Clustering<'a, C::Sample>>
    where
        C: Corpus,
        R: Rng,
    {
        let mut clusters = seed_clusters(corpus, self.k, rng)?;

        for iteration in 1..=self.max_iterations {
            let mut next: Vec<_> = clusters.iter().map(Cluster::next_generation).collect();

            for index in 0..corpus.len() {
                let sample = corpus.sample(index)?;
                let nearest = nearest_cluster(sample, &clusters, self.geometry);
                next[nearest].push(sample);
            }

            for cluster in &mut next {
                if cluster.recalculate_centroid(self.geometry)? {
                    continue;
                }
                match self.empty_cluster_policy {
                    EmptyClusterPolicy::Fail => {
                        return Err(ClusterError::EmptyCluster {
                            cluster_id: cluster.id(),
                            iteration,
                        });
                    }
                    EmptyClusterPolicy::KeepCentroid => {
                        warn!(
                            cluster_id = cluster.id(),
                            iteration, "cluster lost all members, keeping previous centroid"
                        );
                    }
                }
            }

            let changed = next
                .iter()
                .zip(&clusters)
                .filter(|(current, previous)| !current.same_membership(previous))
                .count();
            debug!(iteration, changed_clusters = changed, "lloyd iteration finished");

            clusters = next;
            if changed == 0 {
                info!(
                    iterations = iteration,
                    k = self.k,
                    geometry = ?self.geometry,
                    "k-means converged"
                );
                return Ok(Clustering {
                    clusters,
                    convergence: Convergence::Converged {
                        iterations: iteration,
                    },
                    geometry: self.geometry,
                });
            }
        }

        warn!(
            max_iterations = self.max_iterations,
            k = self.k,
            "k-means stopped at iteration limit before membership stabilized"
        );
        Ok(Clustering {
            clusters,
            convergence: Convergence::IterationLimit {
                iterations: self.max_iterations,
            },
            geometry: self.geometry,
        })
    }
}

/// Index of the cluster closest to `sample`. Ties keep the earlier cluster.
fn nearest_cluster<S: VectorLike>(
    sample: &S,
    clusters: &[Cluster<'_, S>],
    geometry: Geometry,
) -> usize {
    let mut best_index = 0;
    match geometry {
        Geometry::Euclidean => {
            let mut best = f64::INFINITY;
            for (index, cluster) in clusters.iter().enumerate() {
                let dist = sample.distance_from(cluster.centroid());
                if dist < best {
                    best = dist;
                    best_index = index;
                }
            }
        }
        Geometry::Spherical => {
            let mut best = f64::NEG_INFINITY;
            for (index, cluster) in clusters.iter().enumerate() {
                let sim = sample.cosine_similarity(cluster.centroid());
                if sim > best {
                    best = sim;
                    best_index = index;
                }
            }
        }
    }
    best_index
}

/// Euclidean k-means++ clustering with default settings.
///
/// # Errors
/// See [`KMeans::fit_prepared`].
pub fn kmeans_cluster<'a, C, R>(
    corpus: &'a C,
    k: usize,
    rng: &mut R,
) -> Result<Clustering<'a, C::Sample>>
where
    C: Corpus,
    R: Rng,
{
    KMeans::new(k).fit_prepared(corpus, rng)
}

/// Spherical k-means++ clustering with default settings. Normalizes `corpus`.
///
/// # Errors
/// See [`KMeans::fit`].
pub fn spherical_kmeans_cluster<'a, C, R>(
    corpus: &'a mut C,
    k: usize,
    rng: &mut R,
) -> Result<Clustering<'a, C::Sample>>
where
    C: CorpusMut,
    R: Rng,
{
    KMeans::new(k)
        .with_geometry(Geometry::Spherical)
        .fit(corpus, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::VecCorpus;
    use crate::sparse::TermVector;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rustc_hash::FxHashSet;

    fn two_groups() -> VecCorpus<TermVector> {
        vec![
            TermVector::from_pairs(0, [("x", 1.0), ("y", 0.1)]),
            TermVector::from_pairs(1, [("x", 0.9), ("y", 0.2)]),
            TermVector::from_pairs(2, [("x", 1.1), ("y", 0.0)]),
            TermVector::from_pairs(3, [("x", 0.1), ("y", 1.0)]),
            TermVector::from_pairs(4, [("x", 0.0), ("y", 0.9)]),
            TermVector::from_pairs(5, [("y", 1.1), ("z", 0.1)]),
        ]
        .into()
    }

    fn groups_of(clustering: &Clustering<'_, TermVector>) -> Vec<Vec<i64>> {
        let mut groups: Vec<Vec<i64>> = clustering
            .clusters()
            .iter()
            .map(|c| {
                let mut ids: Vec<i64> = c.member_ids().collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        groups.sort();
        groups
    }

    #[test]
    fn euclidean_separates_two_groups() {
        let corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(42);
        let clustering = kmeans_cluster(&corpus, 2, &mut rng).unwrap();

        assert!(clustering.is_converged());
        assert_eq!(groups_of(&clustering), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn spherical_separates_two_groups_and_normalizes() {
        let mut corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(42);
        let clustering = spherical_kmeans_cluster(&mut corpus, 2, &mut rng).unwrap();

        assert!(clustering.is_converged());
        assert_eq!(clustering.geometry(), Geometry::Spherical);
        assert_eq!(groups_of(&clustering), vec![vec![0, 1, 2], vec![3, 4, 5]]);
        for cluster in clustering.clusters() {
            assert!((cluster.centroid().norm() - 1.0).abs() < 1e-9);
            for member in cluster.members() {
                assert!((member.norm() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn single_cluster_collects_everything() {
        let corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(9);
        let clustering = kmeans_cluster(&corpus, 1, &mut rng).unwrap();

        assert_eq!(clustering.convergence(), Convergence::Converged { iterations: 2 });
        assert_eq!(clustering.clusters().len(), 1);
        assert_eq!(clustering.clusters()[0].len(), corpus.len());
    }

    #[test]
    fn centroids_are_owned_after_an_update() {
        let corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(3);
        let clustering = kmeans_cluster(&corpus, 2, &mut rng).unwrap();
        for cluster in clustering.clusters() {
            assert!(!cluster.centroid_is_borrowed());
        }
    }

    #[test]
    fn iteration_cap_is_reported() {
        let corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(42);
        let clustering = KMeans::new(2)
            .with_max_iterations(1)
            .fit_prepared(&corpus, &mut rng)
            .unwrap();
        assert_eq!(
            clustering.convergence(),
            Convergence::IterationLimit { iterations: 1 }
        );
        assert!(!clustering.is_converged());
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let corpus = two_groups();
        let mut rng = StdRng::seed_from_u64(1);
        let err = KMeans::new(2)
            .with_max_iterations(0)
            .fit_prepared(&corpus, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            ClusterError::InvalidParameter {
                name: "max_iterations",
                ..
            }
        ));
    }

    #[test]
    fn spherical_rejects_zero_vectors_before_seeding() {
        let mut corpus: VecCorpus<TermVector> = vec![
            TermVector::from_pairs(0, [("x", 1.0)]),
            TermVector::from_pairs(1, [("x", 0.0)]),
        ]
        .into();
        let mut rng = StdRng::seed_from_u64(1);
        let err = spherical_kmeans_cluster(&mut corpus, 1, &mut rng).unwrap_err();
        assert_eq!(err, ClusterError::DegenerateNormalization { id: 1 });
    }

    // Three identical samples and k = 3: the first two clusters tie with the
    // third on every sample, so the tie-break leaves two clusters empty.
    fn identical_corpus() -> VecCorpus<TermVector> {
        (0..3).map(|i| TermVector::from_pairs(i, [("x", 1.0)])).collect()
    }

    #[test]
    fn empty_cluster_fails_under_fail_policy() {
        let corpus = identical_corpus();
        let mut rng = StdRng::seed_from_u64(2);
        let err = KMeans::new(3)
            .with_empty_cluster_policy(EmptyClusterPolicy::Fail)
            .fit_prepared(&corpus, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            ClusterError::EmptyCluster {
                cluster_id: 1,
                iteration: 1
            }
        );
    }

    #[test]
    fn empty_cluster_keeps_centroid_by_default() {
        let corpus = identical_corpus();
        let mut rng = StdRng::seed_from_u64(2);
        let clustering = KMeans::new(3).fit_prepared(&corpus, &mut rng).unwrap();

        assert!(clustering.is_converged());
        let sizes: Vec<usize> = clustering.clusters().iter().map(Cluster::len).collect();
        assert_eq!(sizes, vec![3, 0, 0]);
        for cluster in clustering.clusters() {
            assert!(!cluster.centroid_is_borrowed());
            for index in 0..corpus.len() {
                assert!(!std::ptr::eq(cluster.centroid(), corpus.sample(index).unwrap()));
            }
        }
    }

    #[test]
    fn ties_keep_the_earlier_cluster() {
        let corpus = identical_corpus();
        let mut rng = StdRng::seed_from_u64(0);
        let clusters = seed_clusters(&corpus, 2, &mut rng).unwrap();
        let sample = corpus.sample(0).unwrap();
        assert_eq!(nearest_cluster(sample, &clusters, Geometry::Euclidean), 0);
        assert_eq!(nearest_cluster(sample, &clusters, Geometry::Spherical), 0);
    }

    #[allow(clippy::cast_precision_loss)]
    fn blob_corpus(points: &[(f64, f64)]) -> VecCorpus<TermVector> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TermVector::from_pairs(i as i64, [("x", x), ("y", y)]))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_sample_lands_in_exactly_one_cluster(
            points in proptest::collection::vec((0.0f64..10.0, 0.0f64..10.0), 1..30),
            k in 1usize..5,
            seed in any::<u64>(),
        ) {
            let corpus = blob_corpus(&points);
            let k = k.min(corpus.len());
            let mut rng = StdRng::seed_from_u64(seed);
            let clustering = KMeans::new(k).fit_prepared(&corpus, &mut rng).unwrap();

            let mut seen = FxHashSet::default();
            let mut total = 0;
            for cluster in clustering.clusters() {
                for id in cluster.member_ids() {
                    prop_assert!(seen.insert(id));
                    total += 1;
                }
            }
            prop_assert_eq!(total, corpus.len());
            prop_assert_eq!(clustering.clusters().len(), k);
        }
    }
}
