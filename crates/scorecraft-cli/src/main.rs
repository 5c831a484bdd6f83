//! scorecraft CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "scorecraft", version, about = "Dynamic scoring-formula engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a formula and optionally test-evaluate it
    Validate {
        /// Formula text, e.g. "accuracy * 0.5 + speed * 0.5"
        #[arg(long)]
        formula: String,

        /// Test variables as name=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Score a telemetry file against a configuration file
    Score {
        /// Scoring configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Raw session telemetry (JSON)
        #[arg(long)]
        telemetry: PathBuf,

        /// User the session belongs to
        #[arg(long, default_value = "local")]
        user: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score ad hoc variables against a configuration, skipping extraction
    Preview {
        /// Scoring configuration (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Test variables (JSON object of name -> number)
        #[arg(long)]
        vars: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compare two or more configuration files pairwise
    Compare {
        /// Configuration files (TOML), compared in the given order
        #[arg(long = "config", num_args = 2.., required = true)]
        configs: Vec<PathBuf>,

        /// Optional shared test variables (JSON object of name -> number)
        #[arg(long)]
        vars: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter configuration and example telemetry file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scorecraft=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { formula, vars } => commands::validate::execute(formula, vars),
        Commands::Score {
            config,
            telemetry,
            user,
            format,
        } => commands::score::execute(config, telemetry, user, format).await,
        Commands::Preview {
            config,
            vars,
            format,
        } => commands::preview::execute(config, vars, format),
        Commands::Compare {
            configs,
            vars,
            format,
        } => commands::compare::execute(configs, vars, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
