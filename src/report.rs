//! Human-readable and JSON summaries of a finished clustering run.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::kmeans::{Clustering, Convergence, Geometry};
use crate::sparse::TermVector;
use crate::stats::{
    SimilarityStats, cluster_quality, inter_cluster_cosine_stats, pairwise_cosine_stats,
};
use crate::vector::SampleId;

/// Number of centroid terms listed per cluster.
pub const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

/// One cluster: id, centroid terms and member ids, plus cohesion figures.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterRecord {
    pub cluster_id: usize,
    pub size: usize,
    pub quality: f64,
    pub cohesion: Option<SimilarityStats>,
    pub centroid_terms: Vec<TermWeight>,
    pub members: Vec<SampleId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeparationRecord {
    pub cluster_a: usize,
    pub cluster_b: usize,
    #[serde(flatten)]
    pub stats: SimilarityStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport {
    pub geometry: Geometry,
    pub convergence: Convergence,
    pub clusters: Vec<ClusterRecord>,
    pub separation: Vec<SeparationRecord>,
    /// Mean of the inter-cluster means over every reported pair.
    pub mean_inter_cluster_similarity: Option<f64>,
}

impl ClusteringReport {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(clustering: &Clustering<'_, TermVector>) -> Self {
        let clusters = clustering.clusters();

        let records = clusters
            .iter()
            .map(|cluster| ClusterRecord {
                cluster_id: cluster.id(),
                size: cluster.len(),
                quality: cluster_quality(cluster),
                cohesion: pairwise_cosine_stats(cluster),
                centroid_terms: cluster
                    .centroid()
                    .top_terms(TOP_TERMS)
                    .into_iter()
                    .map(|(term, weight)| TermWeight {
                        term: term.to_string(),
                        weight,
                    })
                    .collect(),
                members: cluster.member_ids().collect(),
            })
            .collect();

        let mut separation = Vec::new();
        for (i, a) in clusters.iter().enumerate() {
            for b in &clusters[i + 1..] {
                if let Some(stats) = inter_cluster_cosine_stats(a, b) {
                    separation.push(SeparationRecord {
                        cluster_a: a.id(),
                        cluster_b: b.id(),
                        stats,
                    });
                }
            }
        }

        let mean_inter_cluster_similarity = if separation.is_empty() {
            None
        } else {
            Some(separation.iter().map(|s| s.stats.mean).sum::<f64>() / separation.len() as f64)
        };

        Self {
            geometry: clustering.geometry(),
            convergence: clustering.convergence(),
            clusters: records,
            separation,
            mean_inter_cluster_similarity,
        }
    }

    /// Writes the report in `format`.
    ///
    /// # Errors
    /// I/O errors from `out`, or JSON serialization failures.
    pub fn write_to<W: Write>(&self, format: ReportFormat, out: &mut W) -> io::Result<()> {
        match format {
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)
            }
            ReportFormat::Text => self.write_text(out),
        }
    }

    fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.convergence {
            Convergence::Converged { iterations } => {
                writeln!(out, "Converged after {iterations} iterations ({:?})", self.geometry)?;
            }
            Convergence::IterationLimit { iterations } => writeln!(
                out,
                "Stopped at iteration limit {iterations} without converging ({:?})",
                self.geometry
            )?,
        }
        writeln!(out)?;

        for record in &self.clusters {
            writeln!(
                out,
                "Cluster {} ({} members, quality {:.6})",
                record.cluster_id, record.size, record.quality
            )?;
            if let Some(stats) = record.cohesion {
                writeln!(
                    out,
                    "Pairwise cosine similarity: avg {:.6}, stdev {:.6}",
                    stats.mean, stats.std_dev
                )?;
            }
            let terms: Vec<String> = record
                .centroid_terms
                .iter()
                .map(|t| format!("{}({:.6})", t.term, t.weight))
                .collect();
            writeln!(out, "Centroid: {}", terms.join(" "))?;
            let members: Vec<String> = record.members.iter().map(ToString::to_string).collect();
            writeln!(out, "Members: {}", members.join(" "))?;
            writeln!(out, "..........................")?;
        }

        writeln!(out)?;
        writeln!(out, "Inter-cluster cosine similarity")?;
        writeln!(out, "ClusterA ClusterB AvgSim StdevSim")?;
        for record in &self.separation {
            writeln!(
                out,
                "{} {} {:.6} {:.6}",
                record.cluster_a, record.cluster_b, record.stats.mean, record.stats.std_dev
            )?;
        }
        if let Some(mean) = self.mean_inter_cluster_similarity {
            writeln!(out, "Inter-cluster avg sim: {mean:.6}")?;
        }
        Ok(())
    }
}
