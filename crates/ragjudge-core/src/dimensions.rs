//! The six quality dimensions and their fixed weight table.
//!
//! The table is built once at startup and shared read-only by every row
//! evaluation. A table whose weights do not cover every dimension or do not
//! sum to 1.0 is a configuration error; it is never renormalized.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tolerance used for the weight-sum invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Relevance,
    Groundedness,
    Completeness,
    FactualAccuracy,
    Coherence,
    ContextualAwareness,
}

impl Dimension {
    /// Evaluation order. Fixed so that logs and reports are reproducible.
    pub const ALL: [Dimension; 6] = [
        Dimension::Relevance,
        Dimension::Groundedness,
        Dimension::Completeness,
        Dimension::FactualAccuracy,
        Dimension::Coherence,
        Dimension::ContextualAwareness,
    ];

    /// Name shown to the judge model and in human-readable reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Relevance => "Relevance",
            Dimension::Groundedness => "Groundedness",
            Dimension::Completeness => "Completeness",
            Dimension::FactualAccuracy => "Factual Accuracy",
            Dimension::Coherence => "Coherence",
            Dimension::ContextualAwareness => "Contextual Awareness",
        }
    }

    /// Snake-case key used for result fields and CSV column prefixes.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Relevance => "relevance",
            Dimension::Groundedness => "groundedness",
            Dimension::Completeness => "completeness",
            Dimension::FactualAccuracy => "factual_accuracy",
            Dimension::Coherence => "coherence",
            Dimension::ContextualAwareness => "contextual_awareness",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    fn standard_weight(self) -> f64 {
        match self {
            Dimension::Relevance => 0.25,
            Dimension::Groundedness => 0.25,
            Dimension::Completeness => 0.15,
            Dimension::FactualAccuracy => 0.15,
            Dimension::Coherence => 0.10,
            Dimension::ContextualAwareness => 0.10,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTable {
    weights: BTreeMap<Dimension, f64>,
}

impl DimensionTable {
    /// The process-wide weight table: 0.25 / 0.25 / 0.15 / 0.15 / 0.10 / 0.10.
    pub fn standard() -> Self {
        Self {
            weights: Dimension::ALL
                .into_iter()
                .map(|d| (d, d.standard_weight()))
                .collect(),
        }
    }

    /// Build a table from explicit weights, rejecting any inconsistency.
    pub fn new(weights: impl IntoIterator<Item = (Dimension, f64)>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for (dim, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::InvalidWeights(format!(
                    "weight for {} must be within [0, 1], got {}",
                    dim, weight
                )));
            }
            if map.insert(dim, weight).is_some() {
                return Err(ConfigError::InvalidWeights(format!(
                    "duplicate weight for {}",
                    dim
                )));
            }
        }
        let table = Self { weights: map };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for dim in Dimension::ALL {
            if !self.weights.contains_key(&dim) {
                return Err(ConfigError::InvalidWeights(format!(
                    "missing weight for {}",
                    dim
                )));
            }
        }
        let sum = self.weight_sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    pub fn weight(&self, dim: Dimension) -> f64 {
        self.weights.get(&dim).copied().unwrap_or(0.0)
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Plain weighted sum of per-dimension scores. No renormalization.
    pub fn weighted_sum(&self, score_of: impl Fn(Dimension) -> u8) -> f64 {
        Dimension::ALL
            .into_iter()
            .map(|d| f64::from(score_of(d)) * self.weight(d))
            .sum()
    }
}

impl Default for DimensionTable {
    fn default() -> Self {
        Self::standard()
    }
}
