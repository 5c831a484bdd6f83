//! Formula evaluation: a pure, deterministic walk over a validated AST.
//!
//! Evaluation cost is linear in node count; the grammar has no loops or
//! recursion an operator could exploit, so no timeout is needed.

use thiserror::Error;

use crate::formula::{self, BinaryOp, CompareOp, Expr, Formula, Function, ValidationError};
use crate::model::VariableEnvironment;

/// Why a validated formula failed to evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("domain error: {0}")]
    Domain(String),

    #[error("result is not a finite number")]
    NotFinite,
}

/// Either phase of the validate-then-evaluate pipeline can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Evaluate a validated formula against a variable environment.
pub fn evaluate(formula: &Formula, env: &VariableEnvironment) -> Result<f64, EvaluationError> {
    eval_expr(formula.root(), env)
}

/// One-shot validate + evaluate for ad hoc checks. Validation errors take
/// precedence over evaluation errors.
pub fn test_formula(text: &str, env: &VariableEnvironment) -> Result<f64, FormulaError> {
    let formula = formula::validate(text)?;
    Ok(evaluate(&formula, env)?)
}

fn eval_expr(expr: &Expr, env: &VariableEnvironment) -> Result<f64, EvaluationError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable(name) => env
            .get(name)
            .ok_or_else(|| EvaluationError::UndefinedVariable(name.clone())),
        Expr::Neg(inner) => Ok(-eval_expr(inner, env)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            let value = match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        return Err(EvaluationError::DivisionByZero);
                    }
                    lhs / rhs
                }
                BinaryOp::Pow => lhs.powf(rhs),
            };
            // Overflowing arithmetic (e.g. a huge exponent) must surface as
            // an error instead of leaking infinity into clamping.
            if !value.is_finite() {
                return Err(EvaluationError::NotFinite);
            }
            Ok(value)
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            let truth = match op {
                CompareOp::Lt => lhs < rhs,
                CompareOp::Le => lhs <= rhs,
                CompareOp::Gt => lhs > rhs,
                CompareOp::Ge => lhs >= rhs,
                CompareOp::Eq => lhs == rhs,
                CompareOp::Ne => lhs != rhs,
            };
            Ok(if truth { 1.0 } else { 0.0 })
        }
        Expr::Call { function, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, env)?);
            }
            apply_function(*function, &values)
        }
    }
}

fn apply_function(function: Function, args: &[f64]) -> Result<f64, EvaluationError> {
    // Arity was checked at validation time.
    let value = match function {
        Function::Min => args[0].min(args[1]),
        Function::Max => args[0].max(args[1]),
        Function::Abs => args[0].abs(),
        Function::Round => args[0].round(),
        Function::Sqrt => {
            if args[0] < 0.0 {
                return Err(EvaluationError::Domain(format!(
                    "sqrt of negative number {}",
                    args[0]
                )));
            }
            args[0].sqrt()
        }
        Function::Clamp => {
            let (x, lo, hi) = (args[0], args[1], args[2]);
            if lo > hi {
                return Err(EvaluationError::Domain(format!(
                    "clamp bounds inverted: {lo} > {hi}"
                )));
            }
            x.clamp(lo, hi)
        }
        // Both branches are pure and bounded, so they are evaluated eagerly.
        Function::If => {
            if args[0] != 0.0 {
                args[1]
            } else {
                args[2]
            }
        }
    };
    Ok(value)
}
