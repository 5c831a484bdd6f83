//! Version comparator: structural and behavioral diffs between
//! configuration versions.
//!
//! Diffs are pairwise between consecutive configurations in the order
//! given, so N configurations produce N-1 diffs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{round2, ScoringConfiguration, VariableEnvironment};
use crate::scoring::{score_with_environment, ScoringError};

/// Why a comparison could not be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompareError {
    #[error("at least 2 configurations are required, got {0}")]
    NotEnoughConfigurations(usize),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// A configuration labelled with the version it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionedConfiguration {
    pub version: String,
    pub config: ScoringConfiguration,
}

/// One competency's weight differing between two versions. Absence is a
/// distinct value from any present weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightChange {
    pub competency: String,
    pub old: Option<f64>,
    pub new: Option<f64>,
    /// `new - old`, treating absence as 0.
    pub delta: f64,
}

/// One competency's formula text differing verbatim between two versions.
/// Textual equality only; mathematically equivalent rewrites still count
/// as changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormulaChange {
    pub competency: String,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
}

/// The diff between two consecutive configuration versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigurationDiff {
    pub from_version: String,
    pub to_version: String,
    /// Ordered by competency name.
    pub weight_changes: Vec<WeightChange>,
    /// Ordered by competency name.
    pub formula_changes: Vec<FormulaChange>,
    /// `final_score(to) - final_score(from)` under the shared test
    /// environment; absent when no environment was supplied.
    pub score_delta: Option<f64>,
}

impl ConfigurationDiff {
    pub fn is_empty(&self) -> bool {
        self.weight_changes.is_empty()
            && self.formula_changes.is_empty()
            && self.score_delta.unwrap_or(0.0) == 0.0
    }

    /// Render the diff as markdown, for review tooling.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!(
            "### {} -> {}\n\n",
            self.from_version, self.to_version
        ));

        if self.is_empty() {
            md.push_str("No differences.\n");
            return md;
        }

        if !self.weight_changes.is_empty() {
            md.push_str("| Competency | Old weight | New weight | Delta |\n");
            md.push_str("|------------|-----------|-----------|-------|\n");
            for w in &self.weight_changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+.2} |\n",
                    w.competency,
                    w.old.map_or("-".to_string(), |v| v.to_string()),
                    w.new.map_or("-".to_string(), |v| v.to_string()),
                    w.delta
                ));
            }
            md.push('\n');
        }

        for f in &self.formula_changes {
            md.push_str(&format!(
                "- `{}`: `{}` -> `{}`\n",
                f.competency,
                f.old_text.as_deref().unwrap_or("-"),
                f.new_text.as_deref().unwrap_or("-")
            ));
        }

        if let Some(delta) = self.score_delta {
            md.push_str(&format!("\nScore delta: {delta:+.2}\n"));
        }

        md
    }
}

/// Compare an ordered sequence of configuration versions pairwise.
///
/// With a shared test environment, each pair is also scored against it and
/// the diff carries `final_score(to) - final_score(from)`; otherwise only
/// structural differences are reported.
pub fn compare_configurations(
    versions: &[VersionedConfiguration],
    shared_env: Option<&VariableEnvironment>,
) -> Result<Vec<ConfigurationDiff>, CompareError> {
    if versions.len() < 2 {
        return Err(CompareError::NotEnoughConfigurations(versions.len()));
    }

    let mut diffs = Vec::with_capacity(versions.len() - 1);
    for pair in versions.windows(2) {
        diffs.push(diff_pair(&pair[0], &pair[1], shared_env)?);
    }
    Ok(diffs)
}

fn diff_pair(
    from: &VersionedConfiguration,
    to: &VersionedConfiguration,
    shared_env: Option<&VariableEnvironment>,
) -> Result<ConfigurationDiff, CompareError> {
    let mut weight_changes = Vec::new();
    let mut names: Vec<&String> = from
        .config
        .final_weights
        .keys()
        .chain(to.config.final_weights.keys())
        .collect();
    names.sort();
    names.dedup();
    for name in names {
        let old = from.config.final_weights.get(name).copied();
        let new = to.config.final_weights.get(name).copied();
        if old != new {
            weight_changes.push(WeightChange {
                competency: name.clone(),
                old,
                new,
                delta: new.unwrap_or(0.0) - old.unwrap_or(0.0),
            });
        }
    }

    let mut formula_changes = Vec::new();
    let mut names: Vec<&String> = from
        .config
        .competency_formulas
        .keys()
        .chain(to.config.competency_formulas.keys())
        .collect();
    names.sort();
    names.dedup();
    for name in names {
        let old_text = from.config.competency_formulas.get(name);
        let new_text = to.config.competency_formulas.get(name);
        if old_text != new_text {
            formula_changes.push(FormulaChange {
                competency: name.clone(),
                old_text: old_text.cloned(),
                new_text: new_text.cloned(),
            });
        }
    }

    let score_delta = match shared_env {
        Some(env) => {
            let from_score = score_with_environment(&from.config, env)?;
            let to_score = score_with_environment(&to.config, env)?;
            Some(round2(to_score.final_score - from_score.final_score))
        }
        None => None,
    };

    Ok(ConfigurationDiff {
        from_version: from.version.clone(),
        to_version: to.version.clone(),
        weight_changes,
        formula_changes,
        score_delta,
    })
}
