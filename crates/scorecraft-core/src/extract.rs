//! Variable extraction: raw per-session telemetry -> named variables.
//!
//! Each supported game type registers a strategy that knows which telemetry
//! fields exist and how to derive the numeric variables formulas can
//! reference. Adding a game type means registering a new strategy, not
//! editing a conditional.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::{ConfigError, VariableEnvironment};

/// Why telemetry could not be turned into a variable environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("unknown game type '{0}'")]
    UnknownGameType(String),

    /// A field the strategy requires is absent or not numeric. No silent
    /// defaulting; callers decide whether to fall back.
    #[error("missing or non-numeric telemetry field '{0}'")]
    MissingTelemetryField(String),

    #[error(transparent)]
    InvalidVariable(#[from] ConfigError),
}

/// An extraction strategy for one game type. Pure: no side effects, no
/// formula logic.
pub trait VariableExtractor: Send + Sync {
    /// The game-type tag this strategy handles.
    fn game_type(&self) -> &str;

    /// Derive the variable environment from raw telemetry.
    fn extract(&self, raw: &Value) -> Result<VariableEnvironment, ExtractionError>;
}

/// Registry mapping game-type tags to extraction strategies.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn VariableExtractor>>,
}

impl ExtractorRegistry {
    /// An empty registry with no strategies.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// A registry preloaded with the built-in game types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReactionSprintExtractor));
        registry.register(Arc::new(MemoryGridExtractor));
        registry.register(Arc::new(NumberRushExtractor));
        registry
    }

    /// Register a strategy, replacing any previous one for the same tag.
    pub fn register(&mut self, extractor: Arc<dyn VariableExtractor>) {
        let tag = extractor.game_type().to_string();
        if self.extractors.insert(tag.clone(), extractor).is_some() {
            tracing::warn!("replaced variable extractor for game type '{tag}'");
        }
    }

    pub fn game_types(&self) -> Vec<&str> {
        self.extractors.keys().map(String::as_str).collect()
    }

    /// Extract variables for a game type, failing on unregistered tags.
    pub fn extract(
        &self,
        game_type: &str,
        raw: &Value,
    ) -> Result<VariableEnvironment, ExtractionError> {
        let extractor = self
            .extractors
            .get(game_type)
            .ok_or_else(|| ExtractionError::UnknownGameType(game_type.to_string()))?;
        extractor.extract(raw)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Read a required numeric field from raw telemetry.
pub fn require_number(raw: &Value, field: &str) -> Result<f64, ExtractionError> {
    raw.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| ExtractionError::MissingTelemetryField(field.to_string()))
}

/// Percentage ratio that tolerates an empty denominator.
fn ratio_pct(num: f64, den: f64) -> f64 {
    if den <= 0.0 {
        0.0
    } else {
        num / den * 100.0
    }
}

// ---------------------------------------------------------------------------
// Built-in strategies
// ---------------------------------------------------------------------------

/// Tap-the-target reaction game. Requires `hits`, `misses`,
/// `avg_reaction_ms`, `best_reaction_ms`.
pub struct ReactionSprintExtractor;

impl VariableExtractor for ReactionSprintExtractor {
    fn game_type(&self) -> &str {
        "reaction_sprint"
    }

    fn extract(&self, raw: &Value) -> Result<VariableEnvironment, ExtractionError> {
        let hits = require_number(raw, "hits")?;
        let misses = require_number(raw, "misses")?;
        let avg_ms = require_number(raw, "avg_reaction_ms")?;
        let best_ms = require_number(raw, "best_reaction_ms")?;

        let mut env = VariableEnvironment::new();
        env.insert("hits", hits)?;
        env.insert("misses", misses)?;
        env.insert("accuracy", ratio_pct(hits, hits + misses))?;
        env.insert("avg_reaction_ms", avg_ms)?;
        // 0 at or beyond 2s average reaction, 100 at instantaneous.
        env.insert("speed", ((2000.0 - avg_ms) / 2000.0 * 100.0).max(0.0))?;
        env.insert("consistency", if avg_ms > 0.0 { ratio_pct(best_ms, avg_ms) } else { 0.0 })?;
        Ok(env)
    }
}

/// Grid recall memory game. Requires `rounds`, `correct_recalls`,
/// `avg_recall_ms`.
pub struct MemoryGridExtractor;

impl VariableExtractor for MemoryGridExtractor {
    fn game_type(&self) -> &str {
        "memory_grid"
    }

    fn extract(&self, raw: &Value) -> Result<VariableEnvironment, ExtractionError> {
        let rounds = require_number(raw, "rounds")?;
        let correct = require_number(raw, "correct_recalls")?;
        let avg_ms = require_number(raw, "avg_recall_ms")?;

        let mut env = VariableEnvironment::new();
        env.insert("rounds", rounds)?;
        env.insert("correct_recalls", correct)?;
        env.insert("recall_accuracy", ratio_pct(correct, rounds))?;
        env.insert("avg_recall_ms", avg_ms)?;
        env.insert("recall_speed", ((5000.0 - avg_ms) / 5000.0 * 100.0).max(0.0))?;
        Ok(env)
    }
}

/// Timed mental-arithmetic game. Requires `answered`, `correct`,
/// `elapsed_secs`.
pub struct NumberRushExtractor;

impl VariableExtractor for NumberRushExtractor {
    fn game_type(&self) -> &str {
        "number_rush"
    }

    fn extract(&self, raw: &Value) -> Result<VariableEnvironment, ExtractionError> {
        let answered = require_number(raw, "answered")?;
        let correct = require_number(raw, "correct")?;
        let elapsed = require_number(raw, "elapsed_secs")?;

        let mut env = VariableEnvironment::new();
        env.insert("answered", answered)?;
        env.insert("correct", correct)?;
        env.insert("accuracy", ratio_pct(correct, answered))?;
        env.insert("elapsed_secs", elapsed)?;
        // Answers per minute.
        env.insert("pace", if elapsed > 0.0 { answered / elapsed * 60.0 } else { 0.0 })?;
        Ok(env)
    }
}
