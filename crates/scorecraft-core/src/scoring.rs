//! Scoring calculator: extract variables, run every competency formula,
//! clamp, weight, and sum into a composite score.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::eval::{self, FormulaError};
use crate::extract::{ExtractionError, ExtractorRegistry};
use crate::model::{clamp_score, CompetencyScore, ScoreResult, ScoringConfiguration, VariableEnvironment};

/// Why a scoring pass aborted. Partial results are never returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// The first competency whose formula failed to validate or evaluate.
    #[error("formula for competency '{competency}' failed: {source}")]
    Formula {
        competency: String,
        #[source]
        source: FormulaError,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Score raw telemetry against a configuration.
///
/// Extracts the variable environment once, then validates and evaluates
/// every competency formula against it. Any formula failure aborts the
/// whole call.
pub fn calculate_scores(
    registry: &ExtractorRegistry,
    config: &ScoringConfiguration,
    raw_telemetry: &Value,
) -> Result<ScoreResult, ScoringError> {
    let env = registry.extract(&config.game_type, raw_telemetry)?;
    score_with_environment(config, &env)
}

/// Score a configuration against an already-materialized environment.
///
/// Used directly by preview and version comparison, where the variables
/// come from the caller instead of telemetry extraction.
pub fn score_with_environment(
    config: &ScoringConfiguration,
    env: &VariableEnvironment,
) -> Result<ScoreResult, ScoringError> {
    let mut competencies = BTreeMap::new();

    for (competency, text) in &config.competency_formulas {
        let value = eval::test_formula(text, env).map_err(|source| {
            tracing::error!(
                game_type = %config.game_type,
                %competency,
                error = %source,
                "scoring aborted"
            );
            ScoringError::Formula {
                competency: competency.clone(),
                source,
            }
        })?;

        let raw = clamp_score(value);
        // A competency with a formula but no weight scores with weight 0;
        // a weight with no formula contributes nothing at all.
        let weight = config.final_weights.get(competency).copied().unwrap_or(0.0);
        competencies.insert(
            competency.clone(),
            CompetencyScore {
                raw,
                weight,
                weighted: raw * weight,
            },
        );
    }

    Ok(ScoreResult::from_competencies(competencies))
}

/// Score ad hoc formulas/weights against supplied test variables, for
/// exploratory use before a configuration is saved. Same algorithm and
/// failure semantics as [`score_with_environment`].
pub fn preview(
    formulas: &BTreeMap<String, String>,
    weights: &BTreeMap<String, f64>,
    variables: &VariableEnvironment,
) -> Result<ScoreResult, ScoringError> {
    let config = ScoringConfiguration {
        game_type: String::new(),
        competency_formulas: formulas.clone(),
        final_weights: weights.clone(),
        settings: BTreeMap::new(),
    };
    score_with_environment(&config, variables)
}
