//! scorecraft-service — the operation layer between transport and core.
//!
//! Implements the submit, validate-formula, preview, compare, save, and
//! set-active operations with typed request/response payloads. Wire-level
//! transport (HTTP, RPC) sits above this crate and is out of scope.

pub mod error;
pub mod ops;

pub use error::ServiceError;
pub use ops::ScoringService;
