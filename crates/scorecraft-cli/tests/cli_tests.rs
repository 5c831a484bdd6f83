//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn scorecraft() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("scorecraft").unwrap()
}

const CONFIG_V1: &str = r#"
[configuration]
game_type = "reaction_sprint"
version_name = "v1"

[formulas]
precision = "accuracy"
reflex = "speed"

[weights]
precision = 0.6
reflex = 0.4
"#;

const CONFIG_V2: &str = r#"
[configuration]
game_type = "reaction_sprint"
version_name = "v2"

[formulas]
precision = "accuracy"
reflex = "speed * 0.8 + consistency * 0.2"

[weights]
precision = 0.5
reflex = 0.5
"#;

const TELEMETRY: &str = r#"{
  "hits": 40,
  "misses": 10,
  "avg_reaction_ms": 500,
  "best_reaction_ms": 400
}"#;

#[test]
fn validate_valid_formula() {
    scorecraft()
        .arg("validate")
        .arg("--formula")
        .arg("accuracy * 0.5 + speed * 0.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Formula is valid."))
        .stdout(predicate::str::contains("accuracy, speed"));
}

#[test]
fn validate_with_test_variables() {
    scorecraft()
        .arg("validate")
        .arg("--formula")
        .arg("accuracy * 0.5 + speed * 0.5")
        .arg("--var")
        .arg("accuracy=80")
        .arg("--var")
        .arg("speed=60")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test result: 70"));
}

#[test]
fn validate_invalid_formula() {
    scorecraft()
        .arg("validate")
        .arg("--formula")
        .arg("a +* b")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid formula"));
}

#[test]
fn validate_unknown_function() {
    scorecraft()
        .arg("validate")
        .arg("--formula")
        .arg("exec(x)")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown function"));
}

#[test]
fn score_telemetry_against_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let telemetry_path = dir.path().join("session.json");
    std::fs::write(&config_path, CONFIG_V1).unwrap();
    std::fs::write(&telemetry_path, TELEMETRY).unwrap();

    // accuracy 80, speed 75: 80*0.6 + 75*0.4 = 78.
    scorecraft()
        .arg("score")
        .arg("--config")
        .arg(&config_path)
        .arg("--telemetry")
        .arg(&telemetry_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("version 'v1'"))
        .stdout(predicate::str::contains("Final score: 78.00"));
}

#[test]
fn score_json_output() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let telemetry_path = dir.path().join("session.json");
    std::fs::write(&config_path, CONFIG_V1).unwrap();
    std::fs::write(&telemetry_path, TELEMETRY).unwrap();

    scorecraft()
        .arg("score")
        .arg("--config")
        .arg(&config_path)
        .arg("--telemetry")
        .arg(&telemetry_path)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"final_score\": 78.0"));
}

#[test]
fn score_nonexistent_config() {
    scorecraft()
        .arg("score")
        .arg("--config")
        .arg("no_such_config.toml")
        .arg("--telemetry")
        .arg("no_such_telemetry.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn preview_with_variables() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let vars_path = dir.path().join("vars.json");
    std::fs::write(&config_path, CONFIG_V1).unwrap();
    std::fs::write(&vars_path, r#"{"accuracy": 100, "speed": 50}"#).unwrap();

    // 100*0.6 + 50*0.4 = 80.
    scorecraft()
        .arg("preview")
        .arg("--config")
        .arg(&config_path)
        .arg("--vars")
        .arg(&vars_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Final score: 80.00"));
}

#[test]
fn preview_missing_variable_fails() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let vars_path = dir.path().join("vars.json");
    std::fs::write(&config_path, CONFIG_V1).unwrap();
    std::fs::write(&vars_path, r#"{"accuracy": 100}"#).unwrap();

    scorecraft()
        .arg("preview")
        .arg("--config")
        .arg(&config_path)
        .arg("--vars")
        .arg(&vars_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("speed"));
}

#[test]
fn compare_two_configs() {
    let dir = TempDir::new().unwrap();
    let v1_path = dir.path().join("v1.toml");
    let v2_path = dir.path().join("v2.toml");
    std::fs::write(&v1_path, CONFIG_V1).unwrap();
    std::fs::write(&v2_path, CONFIG_V2).unwrap();

    scorecraft()
        .arg("compare")
        .arg("--config")
        .arg(&v1_path)
        .arg(&v2_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("v1 -> v2"))
        .stdout(predicate::str::contains("weight precision: 0.6 -> 0.5"))
        .stdout(predicate::str::contains("formula reflex"));
}

#[test]
fn compare_markdown_output() {
    let dir = TempDir::new().unwrap();
    let v1_path = dir.path().join("v1.toml");
    let v2_path = dir.path().join("v2.toml");
    std::fs::write(&v1_path, CONFIG_V1).unwrap();
    std::fs::write(&v2_path, CONFIG_V2).unwrap();

    scorecraft()
        .arg("compare")
        .arg("--config")
        .arg(&v1_path)
        .arg(&v2_path)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("### v1 -> v2"))
        .stdout(predicate::str::contains("| Competency |"));
}

#[test]
fn compare_requires_two_configs() {
    let dir = TempDir::new().unwrap();
    let v1_path = dir.path().join("v1.toml");
    std::fs::write(&v1_path, CONFIG_V1).unwrap();

    scorecraft()
        .arg("compare")
        .arg("--config")
        .arg(&v1_path)
        .assert()
        .failure();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    scorecraft()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created scorecraft.toml"))
        .stdout(predicate::str::contains("Created telemetry.example.json"));

    assert!(dir.path().join("scorecraft.toml").exists());
    assert!(dir.path().join("telemetry.example.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    scorecraft()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    scorecraft()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_output_scores_cleanly() {
    let dir = TempDir::new().unwrap();

    scorecraft().current_dir(dir.path()).arg("init").assert().success();

    scorecraft()
        .current_dir(dir.path())
        .arg("score")
        .arg("--config")
        .arg("scorecraft.toml")
        .arg("--telemetry")
        .arg("telemetry.example.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Final score:"));
}

#[test]
fn help_output() {
    scorecraft()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dynamic scoring-formula engine"));
}

#[test]
fn version_output() {
    scorecraft()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scorecraft"));
}
