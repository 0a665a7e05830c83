//! Sparse term-weight vectors.
//!
//! A [`TermVector`] maps terms to non-negative weights and omits zero entries.
//! Two vectors rarely share their full key set, so the arithmetic has to be
//! explicit about how missing keys are treated:
//!
//! - `distance_from` sums squared differences over the **union** of keys,
//!   treating a missing key as weight 0 on that side.
//! - `cosine_similarity` only sums the dot product over the **intersection**
//!   of keys, since a missing key contributes 0 to the inner product anyway.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{ClusterError, Result};
use crate::vector::{SampleId, VectorLike};

/// Sparse mapping from term to weight with a lazily cached norm.
#[derive(Debug, Clone, Default)]
pub struct TermVector {
    id: SampleId,
    weights: FxHashMap<String, f64>,
    norm: Cell<Option<f64>>,
}

impl TermVector {
    /// Creates a vector from an existing weight map.
    #[must_use]
    pub fn new(id: SampleId, weights: FxHashMap<String, f64>) -> Self {
        Self {
            id,
            weights,
            norm: Cell::new(None),
        }
    }

    /// Creates a vector from `(term, weight)` pairs. Later duplicates win.
    pub fn from_pairs<I, T>(id: SampleId, pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<String>,
    {
        let weights = pairs
            .into_iter()
            .map(|(term, weight)| (term.into(), weight))
            .collect();
        Self::new(id, weights)
    }

    /// Weight of `term`, if present.
    #[must_use]
    pub fn weight(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    /// Number of supported terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates over `(term, weight)` pairs in arbitrary order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(term, &weight)| (term.as_str(), weight))
    }

    /// The `n` heaviest terms, heaviest first. Ties are ordered by term.
    #[must_use]
    pub fn top_terms(&self, n: usize) -> Vec<(&str, f64)> {
        let mut terms: Vec<(&str, f64)> = self.terms().collect();
        terms.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(b.0),
            other => other,
        });
        terms.truncate(n);
        terms
    }

    fn invalidate_norm(&self) {
        self.norm.set(None);
    }
}

impl PartialEq for TermVector {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TermVector {}

impl VectorLike for TermVector {
    fn id(&self) -> SampleId {
        self.id
    }

    fn distance_from(&self, other: &Self) -> f64 {
        let mut dist = 0.0;
        for (term, &v) in &self.weights {
            let u = other.weights.get(term).copied().unwrap_or(0.0);
            dist += (v - u) * (v - u);
        }
        for (term, &u) in &other.weights {
            if !self.weights.contains_key(term) {
                dist += u * u;
            }
        }
        dist
    }

    fn cosine_similarity(&self, other: &Self) -> f64 {
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }

        let (small, large) = if self.weights.len() <= other.weights.len() {
            (&self.weights, &other.weights)
        } else {
            (&other.weights, &self.weights)
        };
        let dot: f64 = small
            .iter()
            .filter_map(|(term, &v)| large.get(term).map(|&u| u * v))
            .sum();

        dot / denom
    }

    fn norm(&self) -> f64 {
        if let Some(norm) = self.norm.get() {
            return norm;
        }
        let norm = self.weights.values().map(|w| w * w).sum::<f64>().sqrt();
        self.norm.set(Some(norm));
        norm
    }

    fn zero(&self) -> Self {
        Self::default()
    }

    fn add(&mut self, other: &Self) {
        for (term, &weight) in &other.weights {
            *self.weights.entry(term.clone()).or_insert(0.0) += weight;
        }
        self.invalidate_norm();
    }

    fn scalar_multiply(&mut self, factor: f64) {
        for weight in self.weights.values_mut() {
            *weight *= factor;
        }
        self.invalidate_norm();
    }

    fn normalize(&mut self) -> Result<()> {
        let norm = self.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(ClusterError::DegenerateNormalization { id: self.id });
        }
        self.scalar_multiply(1.0 / norm);
        Ok(())
    }
}

impl fmt::Display for TermVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicId: {}, Terms:", self.id)?;
        for (term, weight) in self.top_terms(self.len()) {
            write!(f, " {term}({weight:.6})")?;
        }
        Ok(())
    }
}
