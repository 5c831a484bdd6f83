//! The `scorecraft validate` command.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

use scorecraft_core::eval;
use scorecraft_core::formula;
use scorecraft_core::model::VariableEnvironment;

pub fn execute(formula_text: String, vars: Vec<String>) -> Result<()> {
    let formula = match formula::validate(&formula_text) {
        Ok(formula) => formula,
        Err(err) => {
            bail!("invalid formula: {err}");
        }
    };

    let variables: Vec<String> = formula.variables().into_iter().collect();
    println!("Formula is valid.");
    println!("Variables: {}", variables.join(", "));

    if !vars.is_empty() {
        let env = parse_vars(&vars)?;
        match eval::evaluate(&formula, &env) {
            Ok(value) => println!("Test result: {value}"),
            Err(err) => bail!("evaluation failed: {err}"),
        }
    }

    Ok(())
}

/// Parse repeated `name=value` arguments into an environment.
fn parse_vars(vars: &[String]) -> Result<VariableEnvironment> {
    let mut map = BTreeMap::new();
    for var in vars {
        let Some((name, value)) = var.split_once('=') else {
            bail!("expected name=value, got '{var}'");
        };
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("'{var}' is not a number"))?;
        map.insert(name.trim().to_string(), value);
    }
    Ok(VariableEnvironment::try_from(map)?)
}
