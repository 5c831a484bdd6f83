//! The `scorecraft compare` command.

use std::path::PathBuf;

use anyhow::Result;

use scorecraft_core::compare::{compare_configurations, ConfigurationDiff, VersionedConfiguration};

use crate::config;

pub fn execute(config_paths: Vec<PathBuf>, vars_path: Option<PathBuf>, format: String) -> Result<()> {
    let mut versions = Vec::with_capacity(config_paths.len());
    for path in &config_paths {
        let file = config::load_config(path)?;
        versions.push(VersionedConfiguration {
            version: file.version_name,
            config: file.config,
        });
    }

    let env = vars_path.map(|path| config::load_variables(&path)).transpose()?;
    let diffs = compare_configurations(&versions, env.as_ref())?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&diffs)?),
        "markdown" => {
            for diff in &diffs {
                println!("{}", diff.to_markdown());
            }
        }
        _ => {
            for diff in &diffs {
                print_diff(diff);
            }
        }
    }

    Ok(())
}

fn print_diff(diff: &ConfigurationDiff) {
    println!("{} -> {}", diff.from_version, diff.to_version);

    if diff.is_empty() {
        println!("  no differences");
        return;
    }

    for w in &diff.weight_changes {
        println!(
            "  weight {}: {} -> {} ({:+.2})",
            w.competency,
            w.old.map_or("-".to_string(), |v| v.to_string()),
            w.new.map_or("-".to_string(), |v| v.to_string()),
            w.delta
        );
    }
    for f in &diff.formula_changes {
        println!(
            "  formula {}: '{}' -> '{}'",
            f.competency,
            f.old_text.as_deref().unwrap_or("-"),
            f.new_text.as_deref().unwrap_or("-")
        );
    }
    if let Some(delta) = diff.score_delta {
        println!("  score delta: {delta:+.2}");
    }
}
