//! In-memory store implementations.
//!
//! Reference implementations of the store traits for tests and
//! single-process deployments. All state lives behind a single `RwLock`
//! per store, which is what makes `set_active` atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use scorecraft_core::model::{ScoreResult, ScoringConfiguration};

use crate::traits::{ConfigVersion, ConfigurationStore, SessionStore, StoreError};

#[derive(Default)]
struct ConfigState {
    next_id: u64,
    versions: Vec<ConfigVersion>,
}

/// In-memory [`ConfigurationStore`].
#[derive(Default)]
pub struct MemoryConfigStore {
    state: RwLock<ConfigState>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigurationStore for MemoryConfigStore {
    async fn get_active(&self, game_type: &str) -> Result<ConfigVersion, StoreError> {
        let state = self.state.read().await;
        state
            .versions
            .iter()
            .find(|v| v.active && v.game_type == game_type)
            .cloned()
            .ok_or_else(|| StoreError::NoActiveConfiguration(game_type.to_string()))
    }

    async fn save(
        &self,
        version_name: &str,
        config: ScoringConfiguration,
    ) -> Result<ConfigVersion, StoreError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let version = ConfigVersion {
            version_id: state.next_id,
            version_name: version_name.to_string(),
            game_type: config.game_type.clone(),
            active: false,
            created_at: Utc::now(),
            config,
        };
        state.versions.push(version.clone());
        tracing::debug!(
            game_type = %version.game_type,
            version_id = version.version_id,
            version_name = %version.version_name,
            "configuration version saved"
        );
        Ok(version)
    }

    async fn set_active(&self, game_type: &str, version_id: u64) -> Result<(), StoreError> {
        // One write lock covers the whole deactivate-all-then-activate-one
        // sequence, so concurrent activations serialize.
        let mut state = self.state.write().await;
        if !state
            .versions
            .iter()
            .any(|v| v.version_id == version_id && v.game_type == game_type)
        {
            return Err(StoreError::VersionNotFound(version_id));
        }
        for version in state.versions.iter_mut() {
            if version.game_type == game_type {
                version.active = version.version_id == version_id;
            }
        }
        tracing::debug!(game_type, version_id, "configuration version activated");
        Ok(())
    }

    async fn list_versions(&self, game_type: &str) -> Result<Vec<ConfigVersion>, StoreError> {
        let state = self.state.read().await;
        let mut versions: Vec<ConfigVersion> = state
            .versions
            .iter()
            .filter(|v| v.game_type == game_type)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_id.cmp(&a.version_id));
        Ok(versions)
    }

    async fn get_many(
        &self,
        game_type: &str,
        version_ids: &[u64],
    ) -> Result<Vec<ConfigVersion>, StoreError> {
        let state = self.state.read().await;
        Ok(version_ids
            .iter()
            .filter_map(|id| {
                state
                    .versions
                    .iter()
                    .find(|v| v.version_id == *id && v.game_type == game_type)
                    .cloned()
            })
            .collect())
    }
}

struct StoredSession {
    #[allow(dead_code)]
    user_id: String,
    #[allow(dead_code)]
    game_type: String,
    version_id: u64,
    scores: ScoreResult,
    #[allow(dead_code)]
    completed_at: DateTime<Utc>,
}

/// In-memory [`SessionStore`] with inspection helpers for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, StoredSession>>,
    telemetry: RwLock<HashMap<Uuid, serde_json::Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions recorded so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// The scores recorded for a session, if any.
    pub async fn scores_for(&self, session_id: Uuid) -> Option<ScoreResult> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|s| s.scores.clone())
    }

    /// The version a session was scored with, if any.
    pub async fn version_for(&self, session_id: Uuid) -> Option<u64> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|s| s.version_id)
    }

    /// The raw telemetry recorded for a session, if any.
    pub async fn telemetry_for(&self, session_id: Uuid) -> Option<serde_json::Value> {
        self.telemetry.read().await.get(&session_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn record_session(
        &self,
        user_id: &str,
        game_type: &str,
        version_id: u64,
        scores: &ScoreResult,
        completed_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let session_id = Uuid::new_v4();
        self.sessions.write().await.insert(
            session_id,
            StoredSession {
                user_id: user_id.to_string(),
                game_type: game_type.to_string(),
                version_id,
                scores: scores.clone(),
                completed_at,
            },
        );
        Ok(session_id)
    }

    async fn record_raw_telemetry(
        &self,
        session_id: Uuid,
        raw: serde_json::Value,
    ) -> Result<(), StoreError> {
        if !self.sessions.read().await.contains_key(&session_id) {
            return Err(StoreError::UnknownSession(session_id));
        }
        self.telemetry.write().await.insert(session_id, raw);
        Ok(())
    }
}
