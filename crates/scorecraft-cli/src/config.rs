//! TOML configuration file loading for the CLI.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use scorecraft_core::model::{ScoringConfiguration, VariableEnvironment};

/// Intermediate TOML structure for parsing configuration files.
#[derive(Debug, Deserialize)]
struct TomlConfigFile {
    configuration: TomlHeader,
    #[serde(default)]
    formulas: BTreeMap<String, String>,
    #[serde(default)]
    weights: BTreeMap<String, f64>,
    #[serde(default)]
    settings: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct TomlHeader {
    game_type: String,
    version_name: String,
}

/// A configuration file: the operator's version label plus the typed
/// configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub version_name: String,
    pub config: ScoringConfiguration,
}

/// Load a configuration file from disk.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file: {}", path.display()))?;
    load_config_str(&content, path)
}

/// Parse a TOML string into a [`ConfigFile`] (useful for testing).
pub fn load_config_str(content: &str, source_path: &Path) -> Result<ConfigFile> {
    let parsed: TomlConfigFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let settings = parsed
        .settings
        .into_iter()
        .map(|(key, value)| {
            let json = serde_json::to_value(&value)
                .with_context(|| format!("unsupported setting value for '{key}'"))?;
            Ok((key, json))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let config = ScoringConfiguration::new(
        parsed.configuration.game_type,
        parsed.formulas,
        parsed.weights,
        settings,
    )
    .with_context(|| format!("invalid configuration: {}", source_path.display()))?;

    tracing::debug!(
        path = %source_path.display(),
        game_type = %config.game_type,
        version_name = %parsed.configuration.version_name,
        formulas = config.competency_formulas.len(),
        "configuration loaded"
    );

    Ok(ConfigFile {
        version_name: parsed.configuration.version_name,
        config,
    })
}

/// Load a JSON object of name -> number as a variable environment.
pub fn load_variables(path: &Path) -> Result<VariableEnvironment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read variables file: {}", path.display()))?;
    let map: BTreeMap<String, f64> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse variables JSON: {}", path.display()))?;
    VariableEnvironment::try_from(map)
        .with_context(|| format!("invalid variables: {}", path.display()))
}

/// Load raw session telemetry JSON.
pub fn load_telemetry(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read telemetry file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse telemetry JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[configuration]
game_type = "reaction_sprint"
version_name = "v1-baseline"

[formulas]
precision = "accuracy"
reflex = "speed * 0.8 + consistency * 0.2"

[weights]
precision = 0.6
reflex = 0.4

[settings]
notes = "baseline tuning"
"#;

    #[test]
    fn parse_valid_config() {
        let file = load_config_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(file.version_name, "v1-baseline");
        assert_eq!(file.config.game_type, "reaction_sprint");
        assert_eq!(file.config.competency_formulas.len(), 2);
        assert_eq!(file.config.final_weights["precision"], 0.6);
        assert_eq!(
            file.config.settings["notes"],
            serde_json::json!("baseline tuning")
        );
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[configuration]
game_type = "memory_grid"
version_name = "minimal"
"#;
        let file = load_config_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert!(file.config.competency_formulas.is_empty());
        assert!(file.config.final_weights.is_empty());
    }

    #[test]
    fn reject_negative_weight() {
        let toml = r#"
[configuration]
game_type = "memory_grid"
version_name = "bad"

[weights]
focus = -0.5
"#;
        assert!(load_config_str(toml, &PathBuf::from("test.toml")).is_err());
    }

    #[test]
    fn reject_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(load_config_str(bad, &PathBuf::from("bad.toml")).is_err());
    }
}
