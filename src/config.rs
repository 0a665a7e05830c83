//! Command line / environment configuration for the `topic-kmeans` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kmeans::{DEFAULT_MAX_ITERATIONS, EmptyClusterPolicy, Geometry, KMeans};
use crate::report::ReportFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Args(#[from] clap::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Single-line human readable output.
    Compact,
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path of the topic corpus file to cluster
    #[arg(long, env = "TOPIC_KMEANS_CORPUS")]
    pub corpus: PathBuf,

    /// Number of clusters
    #[arg(long, env = "TOPIC_KMEANS_CLUSTERS", default_value = "100")]
    pub clusters: usize,

    /// Assignment geometry
    #[arg(long, env = "TOPIC_KMEANS_GEOMETRY", value_enum, default_value_t = Geometry::Spherical)]
    pub geometry: Geometry,

    /// Upper bound on Lloyd iterations
    #[arg(long, env = "TOPIC_KMEANS_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// What to do when a cluster loses every member
    #[arg(
        long,
        env = "TOPIC_KMEANS_EMPTY_CLUSTER",
        value_enum,
        default_value_t = EmptyClusterPolicy::KeepCentroid
    )]
    pub empty_cluster: EmptyClusterPolicy,

    /// Random seed for reproducible runs (OS entropy when omitted)
    #[arg(long, env = "TOPIC_KMEANS_SEED")]
    pub seed: Option<u64>,

    /// Report destination (stdout when omitted)
    #[arg(long, env = "TOPIC_KMEANS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Report layout
    #[arg(long, env = "TOPIC_KMEANS_REPORT_FORMAT", value_enum, default_value_t = ReportFormat::Text)]
    pub report_format: ReportFormat,

    /// Log level
    #[arg(long, env = "TOPIC_KMEANS_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log line layout
    #[arg(long, env = "TOPIC_KMEANS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Config {
    /// Parses and validates the process arguments and environment.
    ///
    /// # Errors
    /// [`ConfigError::Args`] for unparseable arguments, otherwise see
    /// [`Config::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args_os())
    }

    /// Parses and validates an explicit argument list (first item is the binary name).
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [`ConfigError::InvalidConfig`] for a zero cluster count, a zero
    /// iteration cap or a corpus path that is not a file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clusters == 0 {
            return Err(ConfigError::InvalidConfig(
                "cluster count must be greater than 0".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidConfig(
                "max iterations must be greater than 0".to_string(),
            ));
        }

        if !self.corpus.is_file() {
            return Err(ConfigError::InvalidConfig(format!(
                "corpus file does not exist: {}",
                self.corpus.display()
            )));
        }

        Ok(())
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub fn kmeans(&self) -> KMeans {
        KMeans::new(self.clusters)
            .with_geometry(self.geometry)
            .with_max_iterations(self.max_iterations)
            .with_empty_cluster_policy(self.empty_cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 0.1 rose 0.2 lily 0.3").unwrap();
        file
    }

    #[test]
    fn defaults_follow_the_topic_clustering_setup() {
        let file = corpus_file();
        let config = Config::from_args(["topic-kmeans", "--corpus", file.path().to_str().unwrap()])
            .unwrap();

        assert_eq!(config.clusters, 100);
        assert_eq!(config.geometry, Geometry::Spherical);
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.empty_cluster, EmptyClusterPolicy::KeepCentroid);
        assert_eq!(config.report_format, ReportFormat::Text);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.seed.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let file = corpus_file();
        let config = Config::from_args([
            "topic-kmeans",
            "--corpus",
            file.path().to_str().unwrap(),
            "--clusters",
            "7",
            "--geometry",
            "euclidean",
            "--empty-cluster",
            "fail",
            "--seed",
            "42",
            "--report-format",
            "json",
            "--log-format",
            "compact",
        ])
        .unwrap();

        let kmeans = config.kmeans();
        assert_eq!(kmeans.k(), 7);
        assert_eq!(kmeans.geometry(), Geometry::Euclidean);
        assert_eq!(kmeans.empty_cluster_policy(), EmptyClusterPolicy::Fail);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[rstest]
    #[case(&["--clusters", "0"], "cluster count")]
    #[case(&["--max-iterations", "0"], "max iterations")]
    fn invalid_values_are_rejected(#[case] extra: &[&str], #[case] needle: &str) {
        let file = corpus_file();
        let path = file.path().to_str().unwrap().to_string();
        let mut args = vec!["topic-kmeans", "--corpus", path.as_str()];
        args.extend_from_slice(extra);

        let err = Config::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
        assert!(err.to_string().contains(needle));
    }

    #[test]
    fn missing_corpus_file_is_rejected() {
        let err = Config::from_args(["topic-kmeans", "--corpus", "/no/such/corpus.dat"])
            .unwrap_err();
        assert!(err.to_string().contains("corpus file does not exist"));
    }

    #[test]
    fn unknown_geometry_is_an_argument_error() {
        let err = Config::from_args([
            "topic-kmeans",
            "--corpus",
            "x.dat",
            "--geometry",
            "manhattan",
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Args(_)));
    }
}
