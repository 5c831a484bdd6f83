//! Store trait definitions.
//!
//! These async traits are the persistence boundary of the system. The core
//! produces the payloads they persist but never calls them directly; the
//! service layer does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use scorecraft_core::model::{ScoreResult, ScoringConfiguration};

/// Errors surfaced by store implementations. The core never retries these;
/// retries, if any, belong to the implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("no active configuration for game type '{0}'")]
    NoActiveConfiguration(String),

    #[error("configuration version {0} not found")]
    VersionNotFound(u64),

    #[error("unknown session {0}")]
    UnknownSession(Uuid),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// A stored configuration version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigVersion {
    /// Store-generated, monotonically increasing identifier.
    pub version_id: u64,
    /// Operator-chosen label; not required to be unique.
    pub version_name: String,
    pub game_type: String,
    /// At most one version is active per game type.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub config: ScoringConfiguration,
}

/// Persistent configuration/version store with active-version bookkeeping.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// The currently active configuration for a game type.
    async fn get_active(&self, game_type: &str) -> Result<ConfigVersion, StoreError>;

    /// Persist a new version with a generated identifier. Saving never
    /// activates; call [`ConfigurationStore::set_active`] separately.
    async fn save(
        &self,
        version_name: &str,
        config: ScoringConfiguration,
    ) -> Result<ConfigVersion, StoreError>;

    /// Atomically deactivate every version for the game type, then
    /// activate the named one. Concurrent calls must never leave two
    /// versions active.
    async fn set_active(&self, game_type: &str, version_id: u64) -> Result<(), StoreError>;

    /// All versions for a game type, newest first.
    async fn list_versions(&self, game_type: &str) -> Result<Vec<ConfigVersion>, StoreError>;

    /// The subset of the requested versions that exist, in request order.
    async fn get_many(
        &self,
        game_type: &str,
        version_ids: &[u64],
    ) -> Result<Vec<ConfigVersion>, StoreError>;
}

/// Session and telemetry persistence. Fire-and-forget from the core's
/// perspective.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a completed, fully scored session.
    async fn record_session(
        &self,
        user_id: &str,
        game_type: &str,
        version_id: u64,
        scores: &ScoreResult,
        completed_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError>;

    /// Attach the raw telemetry that produced a session's scores.
    async fn record_raw_telemetry(
        &self,
        session_id: Uuid,
        raw: serde_json::Value,
    ) -> Result<(), StoreError>;
}
