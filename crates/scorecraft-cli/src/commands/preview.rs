//! The `scorecraft preview` command.
//!
//! Scores a configuration against caller-supplied variables directly,
//! skipping telemetry extraction. Useful for trying formula tweaks before
//! saving anything.

use std::path::PathBuf;

use anyhow::Result;

use scorecraft_core::scoring;

use crate::config;

pub fn execute(config_path: PathBuf, vars_path: PathBuf, format: String) -> Result<()> {
    let file = config::load_config(&config_path)?;
    let env = config::load_variables(&vars_path)?;

    let result = scoring::score_with_environment(&file.config, &env)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Preview of '{}':", file.version_name);
            super::score::print_scores(&result.competencies);
            println!("Final score: {:.2}", result.final_score);
        }
    }

    Ok(())
}
