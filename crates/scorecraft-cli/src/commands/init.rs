//! The `scorecraft init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create scorecraft.toml
    if std::path::Path::new("scorecraft.toml").exists() {
        println!("scorecraft.toml already exists, skipping.");
    } else {
        std::fs::write("scorecraft.toml", SAMPLE_CONFIG)?;
        println!("Created scorecraft.toml");
    }

    // Create example telemetry
    if std::path::Path::new("telemetry.example.json").exists() {
        println!("telemetry.example.json already exists, skipping.");
    } else {
        std::fs::write("telemetry.example.json", EXAMPLE_TELEMETRY)?;
        println!("Created telemetry.example.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit scorecraft.toml with your formulas and weights");
    println!("  2. Run: scorecraft validate --formula \"accuracy * 0.7 + speed * 0.3\"");
    println!("  3. Run: scorecraft score --config scorecraft.toml --telemetry telemetry.example.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# scorecraft configuration

[configuration]
game_type = "reaction_sprint"
version_name = "v1-baseline"

[formulas]
precision = "accuracy"
reflex = "speed * 0.8 + consistency * 0.2"
composure = "min(accuracy, consistency)"

[weights]
precision = 0.5
reflex = 0.3
composure = 0.2

[settings]
notes = "starter configuration"
"#;

const EXAMPLE_TELEMETRY: &str = r#"{
  "hits": 40,
  "misses": 10,
  "avg_reaction_ms": 500,
  "best_reaction_ms": 310
}
"#;
