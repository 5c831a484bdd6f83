//! Core data model types for scorecraft.
//!
//! These are the fundamental types the entire scoring pipeline operates on:
//! configurations, variable environments, and score results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing malformed configurations or environments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A competency weight was negative or not a finite number.
    #[error("weight for competency '{competency}' must be a finite, non-negative number (got {value})")]
    InvalidWeight { competency: String, value: f64 },

    /// A variable value was not a finite number.
    #[error("variable '{name}' must be a finite number (got {value})")]
    NonFiniteVariable { name: String, value: f64 },
}

/// A named, versioned bundle of competency formulas and weights for one
/// game type.
///
/// The version name and activation flag live with the configuration store;
/// the core only ever consumes a configuration it is handed and never
/// mutates or persists it. Competency names in `competency_formulas` and
/// `final_weights` are independent sets: a weight without a formula
/// contributes nothing, a formula without a weight scores with weight 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfiguration {
    /// Game type this configuration scores (e.g. "reaction_sprint").
    pub game_type: String,
    /// Competency name -> formula text.
    pub competency_formulas: BTreeMap<String, String>,
    /// Competency name -> non-negative weight.
    pub final_weights: BTreeMap<String, f64>,
    /// Opaque key/value bag, not interpreted by the core.
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl ScoringConfiguration {
    /// Build a configuration, rejecting negative or non-finite weights.
    pub fn new(
        game_type: impl Into<String>,
        competency_formulas: BTreeMap<String, String>,
        final_weights: BTreeMap<String, f64>,
        settings: BTreeMap<String, serde_json::Value>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            game_type: game_type.into(),
            competency_formulas,
            final_weights,
            settings,
        };
        config.check_weights()?;
        Ok(config)
    }

    /// Verify every weight is finite and non-negative.
    ///
    /// Deserialized configurations bypass [`ScoringConfiguration::new`], so
    /// callers accepting external input should re-check before scoring.
    pub fn check_weights(&self) -> Result<(), ConfigError> {
        for (competency, &value) in &self.final_weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    competency: competency.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// The named-variable snapshot a formula is evaluated against.
///
/// Fully materialized before evaluation begins; every value is a finite
/// real number. Evaluation never writes back into the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VariableEnvironment(BTreeMap<String, f64>);

impl VariableEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, rejecting non-finite values.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Result<(), ConfigError> {
        let name = name.into();
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteVariable { name, value });
        }
        self.0.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, f64>> for VariableEnvironment {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut env = Self::new();
        for (name, value) in map {
            env.insert(name, value)?;
        }
        Ok(env)
    }
}

/// One competency's contribution to the final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompetencyScore {
    /// Evaluator output, clamped to [0, 100].
    pub raw: f64,
    /// Weight from the configuration (0 when absent).
    pub weight: f64,
    /// `raw * weight`.
    pub weighted: f64,
}

/// The composite result of scoring one configuration against one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    /// Per-competency breakdown, keyed by competency name.
    pub competencies: BTreeMap<String, CompetencyScore>,
    /// Sum of weighted scores, rounded half-up to 2 decimals. Deliberately
    /// not clamped: weights summing past 1 can push this past 100.
    pub final_score: f64,
}

impl ScoreResult {
    /// Assemble a result, computing the rounded final score.
    pub fn from_competencies(competencies: BTreeMap<String, CompetencyScore>) -> Self {
        let total: f64 = competencies.values().map(|c| c.weighted).sum();
        Self {
            competencies,
            final_score: round2(total),
        }
    }
}

/// Round half-up to 2 decimal places. Idempotent.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp a raw competency score into [0, 100].
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
