//! scorecraft-store — Configuration and session store contracts.
//!
//! The scoring core never persists anything itself; these traits are the
//! boundary it consumes. The in-memory implementations back the service
//! layer in tests and single-process deployments.

pub mod memory;
pub mod traits;

pub use memory::{MemoryConfigStore, MemorySessionStore};
pub use traits::{ConfigVersion, ConfigurationStore, SessionStore, StoreError};
