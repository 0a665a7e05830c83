//! Line-oriented topic corpus loader.
//!
//! Each line describes one topic:
//!
//! ```text
//! <topic_id> <topic_weight> <term> <weight> [<term> <weight> ...]
//! ```
//!
//! Malformed lines and pairs are skipped with a warning instead of failing the
//! whole load, so a partially damaged export still yields a usable corpus.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{info, warn};

use crate::corpus::{Corpus, CorpusMut};
use crate::error::{ClusterError, Result as ClusterResult};
use crate::sparse::TermVector;
use crate::vector::{SampleId, VectorLike};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open corpus file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read corpus line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// One parsed line: the topic's own weight and its term vector.
#[derive(Debug, Clone)]
pub struct LoadedTopic {
    pub weight: f64,
    pub vector: TermVector,
}

/// Corpus of topics read from a file, in file order.
#[derive(Debug, Clone, Default)]
pub struct TopicCorpus {
    topics: Vec<LoadedTopic>,
}

impl TopicCorpus {
    #[must_use]
    pub fn topics(&self) -> &[LoadedTopic] {
        &self.topics
    }

    /// Topic weights in corpus order.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.topics.iter().map(|t| t.weight)
    }

    #[must_use]
    pub fn into_topics(self) -> Vec<LoadedTopic> {
        self.topics
    }
}

impl Corpus for TopicCorpus {
    type Sample = TermVector;

    fn len(&self) -> usize {
        self.topics.len()
    }

    fn sample(&self, index: usize) -> ClusterResult<&TermVector> {
        let len = self.topics.len();
        self.topics
            .get(index)
            .map(|t| &t.vector)
            .ok_or(ClusterError::IndexOutOfRange { index, len })
    }
}

impl CorpusMut for TopicCorpus {
    fn sample_mut(&mut self, index: usize) -> ClusterResult<&mut TermVector> {
        let len = self.topics.len();
        self.topics
            .get_mut(index)
            .map(|t| &mut t.vector)
            .ok_or(ClusterError::IndexOutOfRange { index, len })
    }
}

/// Loads a topic corpus from `path`.
///
/// # Errors
/// [`LoadError::Open`] if the file cannot be opened, [`LoadError::Read`] on
/// I/O failure while reading.
pub fn load_path(path: impl AsRef<Path>) -> Result<TopicCorpus, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let corpus = parse_reader(BufReader::new(file))?;
    info!(
        path = %path.display(),
        topics = corpus.len(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Parses a topic corpus from any buffered reader.
///
/// # Errors
/// [`LoadError::Read`] on I/O failure.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<TopicCorpus, LoadError> {
    let mut topics = Vec::new();
    let mut seen = FxHashSet::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| LoadError::Read {
            line: line_no,
            source,
        })?;
        let Some(topic) = parse_line(line.trim(), line_no) else {
            continue;
        };
        if !seen.insert(topic.vector.id()) {
            warn!(line = line_no, topic_id = topic.vector.id(), "skipping duplicate topic id");
            continue;
        }
        topics.push(topic);
    }
    Ok(TopicCorpus { topics })
}

fn parse_line(line: &str, line_no: usize) -> Option<LoadedTopic> {
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        warn!(line = line_no, content = line, "skipping corpus line with too few fields");
        return None;
    }

    let Ok(id) = fields[0].parse::<SampleId>() else {
        warn!(line = line_no, field = fields[0], "skipping corpus line with invalid topic id");
        return None;
    };
    let Ok(weight) = fields[1].parse::<f64>() else {
        warn!(line = line_no, field = fields[1], "skipping corpus line with invalid topic weight");
        return None;
    };

    let mut weights = FxHashMap::default();
    for pair in fields[2..].chunks(2) {
        match pair {
            [term, value] => match value.parse::<f64>() {
                Ok(w) if w.is_finite() && w >= 0.0 => {
                    weights.insert((*term).to_string(), w);
                }
                _ => {
                    warn!(line = line_no, term = *term, value = *value, "skipping invalid term weight");
                }
            },
            [term] => {
                warn!(line = line_no, term = *term, "skipping term without weight");
            }
            _ => {}
        }
    }

    Some(LoadedTopic {
        weight,
        vector: TermVector::new(id, weights),
    })
}
