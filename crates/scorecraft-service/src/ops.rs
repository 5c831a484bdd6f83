//! The scoring operations and their request/response payloads.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scorecraft_core::compare::{compare_configurations, ConfigurationDiff, VersionedConfiguration};
use scorecraft_core::eval;
use scorecraft_core::extract::ExtractorRegistry;
use scorecraft_core::formula;
use scorecraft_core::model::{ScoreResult, ScoringConfiguration, VariableEnvironment};
use scorecraft_core::scoring::{self, ScoringError};
use scorecraft_store::{ConfigVersion, ConfigurationStore, SessionStore};

use crate::error::ServiceError;

/// Input to the submit operation: one completed session's raw telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub game_type: String,
    pub user_id: String,
    pub raw_data: serde_json::Value,
}

/// Outcome of a successful submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub session_id: Uuid,
    /// The configuration version the session was scored with.
    pub version_used: u64,
    pub scores: ScoreResult,
}

/// Input to the validate-formula operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub formula: String,
    /// Optional variables for a one-shot test evaluation.
    #[serde(default)]
    pub test_variables: Option<BTreeMap<String, f64>>,
}

/// Result of validating (and optionally test-evaluating) a formula.
/// Formula problems are data here, not errors: the caller is checking
/// interactively and renders them alongside the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the formula parsed within complexity bounds. A test
    /// evaluation failure leaves this true and sets `error` instead.
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_result: Option<f64>,
}

/// Input to the preview operation: ad hoc formulas and weights, before
/// anything is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub game_type: String,
    pub formulas: BTreeMap<String, String>,
    pub weights: BTreeMap<String, f64>,
    pub test_variables: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub scores: ScoreResult,
}

/// Input to the compare operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub game_type: String,
    /// At least 2, compared pairwise in this order.
    pub version_ids: Vec<u64>,
    /// Optional raw telemetry evaluated against every version.
    #[serde(default)]
    pub test_data: Option<serde_json::Value>,
}

/// One version's side of a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionComparison {
    pub version_id: u64,
    pub version_name: String,
    pub config: ScoringConfiguration,
    /// Present only when the request carried test data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponse {
    pub comparisons: Vec<VersionComparison>,
    pub differences: Vec<ConfigurationDiff>,
}

/// Input to the save operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub game_type: String,
    pub version_name: String,
    pub formulas: BTreeMap<String, String>,
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// The scoring operations, wired to store collaborators.
pub struct ScoringService {
    config_store: Arc<dyn ConfigurationStore>,
    session_store: Arc<dyn SessionStore>,
    registry: ExtractorRegistry,
}

impl ScoringService {
    /// A service with the built-in game-type extractors.
    pub fn new(
        config_store: Arc<dyn ConfigurationStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::with_registry(config_store, session_store, ExtractorRegistry::with_builtins())
    }

    pub fn with_registry(
        config_store: Arc<dyn ConfigurationStore>,
        session_store: Arc<dyn SessionStore>,
        registry: ExtractorRegistry,
    ) -> Self {
        Self {
            config_store,
            session_store,
            registry,
        }
    }

    /// Score a completed session against the active configuration and
    /// persist it. All-or-nothing: a scoring failure persists nothing.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        if request.user_id.trim().is_empty() {
            return Err(ServiceError::Input("user_id is required".into()));
        }

        let active = self.config_store.get_active(&request.game_type).await?;
        let scores = scoring::calculate_scores(&self.registry, &active.config, &request.raw_data)?;

        let session_id = self
            .session_store
            .record_session(
                &request.user_id,
                &request.game_type,
                active.version_id,
                &scores,
                Utc::now(),
            )
            .await?;

        if let Err(err) = self
            .session_store
            .record_raw_telemetry(session_id, request.raw_data)
            .await
        {
            tracing::error!(%session_id, error = %err, "failed to record raw telemetry");
            return Err(err.into());
        }

        tracing::info!(
            %session_id,
            game_type = %request.game_type,
            version = active.version_id,
            final_score = scores.final_score,
            "session scored"
        );

        Ok(SubmitResponse {
            session_id,
            version_used: active.version_id,
            scores,
        })
    }

    /// Check a formula and optionally test-evaluate it. Formula problems
    /// come back inside the response, never as an `Err`.
    pub fn validate_formula(&self, request: ValidateRequest) -> ValidateResponse {
        let formula = match formula::validate(&request.formula) {
            Ok(formula) => formula,
            Err(err) => {
                return ValidateResponse {
                    valid: false,
                    error: Some(err.to_string()),
                    variables: Vec::new(),
                    test_result: None,
                }
            }
        };

        let variables: Vec<String> = formula.variables().into_iter().collect();

        let (error, test_result) = match request.test_variables {
            Some(map) => match VariableEnvironment::try_from(map) {
                Ok(env) => match eval::evaluate(&formula, &env) {
                    Ok(value) => (None, Some(value)),
                    Err(err) => (Some(err.to_string()), None),
                },
                Err(err) => (Some(err.to_string()), None),
            },
            None => (None, None),
        };

        ValidateResponse {
            valid: true,
            error,
            variables,
            test_result,
        }
    }

    /// Score ad hoc formulas/weights against supplied variables.
    pub fn preview(&self, request: PreviewRequest) -> Result<PreviewResponse, ServiceError> {
        if request.formulas.is_empty() {
            return Err(ServiceError::Input("at least one formula is required".into()));
        }
        let env = VariableEnvironment::try_from(request.test_variables)
            .map_err(|err| ServiceError::Input(err.to_string()))?;
        let scores = scoring::preview(&request.formulas, &request.weights, &env)?;
        Ok(PreviewResponse { scores })
    }

    /// Compare stored configuration versions structurally and, when test
    /// data is supplied, behaviorally.
    pub async fn compare(&self, request: CompareRequest) -> Result<CompareResponse, ServiceError> {
        if request.version_ids.len() < 2 {
            return Err(ServiceError::Input(format!(
                "at least 2 version ids are required, got {}",
                request.version_ids.len()
            )));
        }

        let versions = self
            .config_store
            .get_many(&request.game_type, &request.version_ids)
            .await?;
        if versions.len() != request.version_ids.len() {
            let missing: Vec<String> = request
                .version_ids
                .iter()
                .filter(|id| !versions.iter().any(|v| v.version_id == **id))
                .map(u64::to_string)
                .collect();
            return Err(ServiceError::NotFound(format!(
                "configuration version(s) {} for game type '{}'",
                missing.join(", "),
                request.game_type
            )));
        }

        let shared_env = match &request.test_data {
            Some(raw) => Some(
                self.registry
                    .extract(&request.game_type, raw)
                    .map_err(ScoringError::Extraction)?,
            ),
            None => None,
        };

        let mut comparisons = Vec::with_capacity(versions.len());
        for version in &versions {
            let scores = match &shared_env {
                Some(env) => Some(
                    scoring::score_with_environment(&version.config, env)
                        .map_err(ServiceError::Scoring)?,
                ),
                None => None,
            };
            comparisons.push(VersionComparison {
                version_id: version.version_id,
                version_name: version.version_name.clone(),
                config: version.config.clone(),
                scores,
            });
        }

        let labelled: Vec<VersionedConfiguration> = versions
            .iter()
            .map(|v| VersionedConfiguration {
                version: v.version_name.clone(),
                config: v.config.clone(),
            })
            .collect();
        let differences = compare_configurations(&labelled, shared_env.as_ref())
            .map_err(|err| match err {
                scorecraft_core::compare::CompareError::NotEnoughConfigurations(n) => {
                    ServiceError::Input(format!("at least 2 version ids are required, got {n}"))
                }
                scorecraft_core::compare::CompareError::Scoring(err) => ServiceError::Scoring(err),
            })?;

        Ok(CompareResponse {
            comparisons,
            differences,
        })
    }

    /// Validate every formula in a submitted configuration, then persist
    /// it as a new (inactive) version.
    pub async fn save_version(&self, request: SaveRequest) -> Result<ConfigVersion, ServiceError> {
        for (competency, text) in &request.formulas {
            formula::validate(text).map_err(|source| ServiceError::Validation {
                competency: competency.clone(),
                source,
            })?;
        }

        let config = ScoringConfiguration::new(
            request.game_type,
            request.formulas,
            request.weights,
            request.settings,
        )
        .map_err(|err| ServiceError::Input(err.to_string()))?;

        Ok(self.config_store.save(&request.version_name, config).await?)
    }

    /// Activate one version, deactivating every other version for the
    /// game type.
    pub async fn set_active(&self, game_type: &str, version_id: u64) -> Result<(), ServiceError> {
        Ok(self.config_store.set_active(game_type, version_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecraft_store::{MemoryConfigStore, MemorySessionStore};
    use serde_json::json;

    struct Fixture {
        service: ScoringService,
        sessions: Arc<MemorySessionStore>,
    }

    fn fixture() -> Fixture {
        let configs = Arc::new(MemoryConfigStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let service = ScoringService::new(configs, Arc::clone(&sessions) as Arc<dyn SessionStore>);
        Fixture { service, sessions }
    }

    fn save_request(version_name: &str, formula: &str, weight: f64) -> SaveRequest {
        SaveRequest {
            game_type: "reaction_sprint".into(),
            version_name: version_name.into(),
            formulas: BTreeMap::from([("precision".to_string(), formula.to_string())]),
            weights: BTreeMap::from([("precision".to_string(), weight)]),
            settings: BTreeMap::new(),
        }
    }

    fn telemetry() -> serde_json::Value {
        json!({
            "hits": 40,
            "misses": 10,
            "avg_reaction_ms": 500.0,
            "best_reaction_ms": 400.0,
        })
    }

    #[tokio::test]
    async fn submit_scores_and_persists() {
        let fx = fixture();
        let saved = fx
            .service
            .save_version(save_request("v1", "accuracy", 1.0))
            .await
            .unwrap();
        fx.service
            .set_active("reaction_sprint", saved.version_id)
            .await
            .unwrap();

        let response = fx
            .service
            .submit(SubmitRequest {
                game_type: "reaction_sprint".into(),
                user_id: "user-1".into(),
                raw_data: telemetry(),
            })
            .await
            .unwrap();

        assert_eq!(response.version_used, saved.version_id);
        assert_eq!(response.scores.final_score, 80.0);
        assert_eq!(fx.sessions.session_count().await, 1);
        assert_eq!(
            fx.sessions.telemetry_for(response.session_id).await,
            Some(telemetry())
        );
    }

    #[tokio::test]
    async fn submit_without_active_configuration_is_not_found() {
        let fx = fixture();
        let err = fx
            .service
            .submit(SubmitRequest {
                game_type: "reaction_sprint".into(),
                user_id: "user-1".into(),
                raw_data: telemetry(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(fx.sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn submit_aborts_without_persisting_on_formula_failure() {
        let fx = fixture();
        // Valid syntax, but the variable does not exist for this game type.
        let saved = fx
            .service
            .save_version(save_request("v1", "no_such_variable * 2", 1.0))
            .await
            .unwrap();
        fx.service
            .set_active("reaction_sprint", saved.version_id)
            .await
            .unwrap();

        let err = fx
            .service
            .submit(SubmitRequest {
                game_type: "reaction_sprint".into(),
                user_id: "user-1".into(),
                raw_data: telemetry(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "scoring_error");
        assert!(err.to_string().contains("precision"));
        assert_eq!(fx.sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn submit_requires_user_id() {
        let fx = fixture();
        let err = fx
            .service
            .submit(SubmitRequest {
                game_type: "reaction_sprint".into(),
                user_id: "  ".into(),
                raw_data: telemetry(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }

    #[tokio::test]
    async fn validate_formula_reports_variables() {
        let fx = fixture();
        let response = fx.service.validate_formula(ValidateRequest {
            formula: "a + b * 2".into(),
            test_variables: None,
        });
        assert!(response.valid);
        assert_eq!(response.variables, vec!["a".to_string(), "b".to_string()]);
        assert!(response.error.is_none());
        assert!(response.test_result.is_none());
    }

    #[tokio::test]
    async fn validate_formula_reports_syntax_errors_as_data() {
        let fx = fixture();
        let response = fx.service.validate_formula(ValidateRequest {
            formula: "a +* b".into(),
            test_variables: None,
        });
        assert!(!response.valid);
        assert!(response.error.is_some());
        assert!(response.variables.is_empty());
    }

    #[tokio::test]
    async fn validate_formula_with_test_variables() {
        let fx = fixture();
        let response = fx.service.validate_formula(ValidateRequest {
            formula: "accuracy * 0.5 + speed * 0.5".into(),
            test_variables: Some(BTreeMap::from([
                ("accuracy".to_string(), 80.0),
                ("speed".to_string(), 60.0),
            ])),
        });
        assert!(response.valid);
        assert_eq!(response.test_result, Some(70.0));
    }

    #[tokio::test]
    async fn validate_formula_evaluation_failure_keeps_valid() {
        let fx = fixture();
        let response = fx.service.validate_formula(ValidateRequest {
            formula: "a / b".into(),
            test_variables: Some(BTreeMap::from([
                ("a".to_string(), 10.0),
                ("b".to_string(), 0.0),
            ])),
        });
        assert!(response.valid);
        assert!(response.error.unwrap().contains("division by zero"));
        assert!(response.test_result.is_none());
    }

    #[tokio::test]
    async fn preview_scores_ad_hoc_inputs() {
        let fx = fixture();
        let response = fx
            .service
            .preview(PreviewRequest {
                game_type: "reaction_sprint".into(),
                formulas: BTreeMap::from([(
                    "overall".to_string(),
                    "accuracy * 0.5 + speed * 0.5".to_string(),
                )]),
                weights: BTreeMap::from([("overall".to_string(), 1.0)]),
                test_variables: BTreeMap::from([
                    ("accuracy".to_string(), 80.0),
                    ("speed".to_string(), 60.0),
                ]),
            })
            .unwrap();
        assert_eq!(response.scores.final_score, 70.0);
    }

    #[tokio::test]
    async fn preview_names_failing_competency() {
        let fx = fixture();
        let err = fx
            .service
            .preview(PreviewRequest {
                game_type: "reaction_sprint".into(),
                formulas: BTreeMap::from([("broken".to_string(), "a +* b".to_string())]),
                weights: BTreeMap::new(),
                test_variables: BTreeMap::new(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), "scoring_error");
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn compare_requires_two_ids() {
        let fx = fixture();
        let err = fx
            .service
            .compare(CompareRequest {
                game_type: "reaction_sprint".into(),
                version_ids: vec![1],
                test_data: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }

    #[tokio::test]
    async fn compare_names_missing_versions() {
        let fx = fixture();
        let saved = fx
            .service
            .save_version(save_request("v1", "accuracy", 1.0))
            .await
            .unwrap();
        let err = fx
            .service
            .compare(CompareRequest {
                game_type: "reaction_sprint".into(),
                version_ids: vec![saved.version_id, 999],
                test_data: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("999"));
    }

    #[tokio::test]
    async fn compare_structural_and_behavioral() {
        let fx = fixture();
        let v1 = fx
            .service
            .save_version(save_request("v1", "accuracy", 0.3))
            .await
            .unwrap();
        let v2 = fx
            .service
            .save_version(save_request("v2", "accuracy", 0.5))
            .await
            .unwrap();

        let response = fx
            .service
            .compare(CompareRequest {
                game_type: "reaction_sprint".into(),
                version_ids: vec![v1.version_id, v2.version_id],
                test_data: Some(telemetry()),
            })
            .await
            .unwrap();

        assert_eq!(response.comparisons.len(), 2);
        assert!(response.comparisons[0].scores.is_some());
        assert_eq!(response.differences.len(), 1);

        let diff = &response.differences[0];
        assert_eq!(diff.weight_changes.len(), 1);
        assert_eq!(diff.weight_changes[0].competency, "precision");
        // accuracy is 80: 80*0.5 - 80*0.3 = 16.
        assert_eq!(diff.score_delta, Some(16.0));
    }

    #[tokio::test]
    async fn compare_without_test_data_is_structural_only() {
        let fx = fixture();
        let v1 = fx
            .service
            .save_version(save_request("v1", "accuracy", 0.3))
            .await
            .unwrap();
        let v2 = fx
            .service
            .save_version(save_request("v2", "accuracy", 0.5))
            .await
            .unwrap();

        let response = fx
            .service
            .compare(CompareRequest {
                game_type: "reaction_sprint".into(),
                version_ids: vec![v1.version_id, v2.version_id],
                test_data: None,
            })
            .await
            .unwrap();

        assert!(response.comparisons[0].scores.is_none());
        assert_eq!(response.differences[0].score_delta, None);
    }

    #[tokio::test]
    async fn save_rejects_invalid_formula_naming_competency() {
        let fx = fixture();
        let err = fx
            .service
            .save_version(save_request("v1", "a + (b", 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("precision"));
    }

    #[tokio::test]
    async fn save_rejects_negative_weight() {
        let fx = fixture();
        let err = fx
            .service
            .save_version(save_request("v1", "accuracy", -1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }

    #[tokio::test]
    async fn set_active_unknown_version_is_not_found() {
        let fx = fixture();
        let err = fx
            .service
            .set_active("reaction_sprint", 42)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
