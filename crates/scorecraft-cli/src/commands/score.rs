//! The `scorecraft score` command.
//!
//! Runs the full submit pipeline against in-memory stores: the
//! configuration file is saved and activated, the telemetry is scored,
//! and the resulting session is recorded (and discarded on exit). This is
//! the same code path a deployment drives through the service layer.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use scorecraft_service::ops::{SaveRequest, SubmitRequest};
use scorecraft_service::ScoringService;
use scorecraft_store::{MemoryConfigStore, MemorySessionStore};

use crate::config;

pub async fn execute(
    config_path: PathBuf,
    telemetry_path: PathBuf,
    user: String,
    format: String,
) -> Result<()> {
    let file = config::load_config(&config_path)?;
    let telemetry = config::load_telemetry(&telemetry_path)?;

    let service = ScoringService::new(
        Arc::new(MemoryConfigStore::new()),
        Arc::new(MemorySessionStore::new()),
    );

    let game_type = file.config.game_type.clone();
    let saved = service
        .save_version(SaveRequest {
            game_type: game_type.clone(),
            version_name: file.version_name,
            formulas: file.config.competency_formulas,
            weights: file.config.final_weights,
            settings: file.config.settings,
        })
        .await?;
    service.set_active(&game_type, saved.version_id).await?;

    let response = service
        .submit(SubmitRequest {
            game_type,
            user_id: user,
            raw_data: telemetry,
        })
        .await?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        _ => {
            println!(
                "Scored with version '{}' (session {})",
                saved.version_name, response.session_id
            );
            print_scores(&response.scores.competencies);
            println!("Final score: {:.2}", response.scores.final_score);
        }
    }

    Ok(())
}

pub(crate) fn print_scores(
    competencies: &BTreeMap<String, scorecraft_core::model::CompetencyScore>,
) {
    for (name, score) in competencies {
        println!(
            "  {name}: raw {:.2} x weight {} = {:.2}",
            score.raw, score.weight, score.weighted
        );
    }
}
