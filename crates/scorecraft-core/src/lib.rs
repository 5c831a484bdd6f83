//! scorecraft-core — Formula parsing, evaluation, and scoring.
//!
//! This crate implements the dynamic formula subsystem: a safe expression
//! parser/validator, a deterministic evaluator over named variables, a
//! per-game-type variable extraction registry, the scoring calculator that
//! combines competency formulas with weights, and a configuration version
//! comparator. Everything here is synchronous and side-effect free.

pub mod compare;
pub mod eval;
pub mod extract;
pub mod formula;
pub mod model;
pub mod scoring;
