#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions, // e.g. ClusterError in error module
    clippy::missing_panics_doc,      // panics are limited to tests
    clippy::doc_markdown
)]

//! k-means++ seeding and Lloyd refinement over sparse topic term vectors,
//! with a spherical (cosine) variant.
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use topic_kmeans::{Geometry, KMeans, TermVector, VecCorpus};
//!
//! let mut corpus: VecCorpus<TermVector> = vec![
//!     TermVector::from_pairs(0, [("rose", 0.6), ("lily", 0.4)]),
//!     TermVector::from_pairs(1, [("rose", 0.5), ("lily", 0.5)]),
//!     TermVector::from_pairs(2, [("game", 0.7), ("anime", 0.3)]),
//! ]
//! .into();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let clustering = KMeans::new(2)
//!     .with_geometry(Geometry::Spherical)
//!     .fit(&mut corpus, &mut rng)
//!     .unwrap();
//! assert_eq!(clustering.clusters().len(), 2);
//! ```

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod error;
pub mod kmeans;
pub mod loader;
pub mod observability;
pub mod report;
pub mod seeding;
pub mod sparse;
pub mod stats;
pub mod vector;

pub use cluster::Cluster;
pub use corpus::{Corpus, CorpusMut, VecCorpus, normalize_all};
pub use error::{ClusterError, Result};
pub use kmeans::{
    Clustering, Convergence, EmptyClusterPolicy, Geometry, KMeans, kmeans_cluster,
    spherical_kmeans_cluster,
};
pub use loader::{LoadError, LoadedTopic, TopicCorpus, load_path, parse_reader};
pub use report::{ClusteringReport, ReportFormat};
pub use seeding::seed_clusters;
pub use sparse::TermVector;
pub use stats::{SimilarityStats, cluster_quality, inter_cluster_cosine_stats, pairwise_cosine_stats};
pub use vector::{SampleId, VectorLike};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
