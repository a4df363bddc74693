use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::state::{Artifact, SessionError, SessionPhase, SessionState};
use super::store::SessionStore;
use crate::error::{PilotError, Result};

/// Durable session persistence with a write-through in-memory cache.
///
/// The manager owns the authoritative copy of every session it has touched.
/// All mutating operations persist before returning; cache guards are never
/// held across awaits.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cache: RwLock<HashMap<String, SessionState>>,
    instance_id: String,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, instance_id: impl Into<String>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Create and immediately persist a fresh session for a mission.
    pub async fn create_session(
        &self,
        mission_id: &str,
        repository: &str,
    ) -> Result<SessionState> {
        let state = SessionState::new(mission_id, repository, self.instance_id.clone());
        self.save_session(&state).await?;
        info!(
            session_id = state.session_id,
            mission_id, "Session created"
        );
        Ok(state)
    }

    /// Cache-first load. Absence is `None`, not an error.
    pub async fn load_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        if let Some(state) = self.cache.read().get(session_id) {
            return Ok(Some(state.clone()));
        }

        let loaded = self.store.get(session_id).await?;
        if let Some(ref state) = loaded {
            self.cache
                .write()
                .insert(state.session_id.clone(), state.clone());
        }
        Ok(loaded)
    }

    /// Overwrite the durable record, then the cache.
    pub async fn save_session(&self, state: &SessionState) -> Result<()> {
        self.store.put(state).await?;
        self.cache
            .write()
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    pub async fn update_phase(
        &self,
        session_id: &str,
        phase: SessionPhase,
    ) -> Result<SessionState> {
        self.mutate(session_id, |state| {
            if !state.current_phase.can_transition_to(phase) && state.current_phase != phase {
                debug!(
                    session_id = state.session_id,
                    from = %state.current_phase,
                    to = %phase,
                    "Unmodeled phase transition"
                );
            }
            state.current_phase = phase;
        })
        .await
    }

    /// Persist an artifact, assigning its per-path monotonic version.
    pub async fn add_artifact(&self, session_id: &str, artifact: Artifact) -> Result<SessionState> {
        self.mutate(session_id, |state| {
            let mut artifact = artifact;
            artifact.version = state.next_artifact_version(&artifact.path);
            artifact.updated_at = Utc::now();
            state.artifacts.push(artifact);
        })
        .await
    }

    pub async fn add_error(&self, session_id: &str, error: SessionError) -> Result<SessionState> {
        self.mutate(session_id, |state| state.errors.push(error)).await
    }

    /// Set `last_checkpoint`, append an immutable snapshot to the checkpoint
    /// history, then save the primary record. History is never pruned here.
    pub async fn checkpoint(&self, session_id: &str) -> Result<SessionState> {
        let mut state = self.require(session_id).await?;
        let now = Utc::now();
        state.last_checkpoint = Some(now);

        self.store.put_checkpoint(&state, now).await?;
        self.save_session(&state).await?;

        info!(session_id, at = %now, "Checkpoint written");
        Ok(state)
    }

    /// Restore a session after a restart.
    ///
    /// Prefers the newest checkpoint snapshot, forcing its phase to
    /// ErrorRecovery so the control loop knows it resumed from a checkpoint,
    /// and persists that. Falls back to the plain saved record.
    pub async fn recover(&self, session_id: &str) -> Result<SessionState> {
        if let Some(mut snapshot) = self.store.latest_checkpoint(session_id).await? {
            snapshot.current_phase = SessionPhase::ErrorRecovery;
            self.save_session(&snapshot).await?;
            info!(session_id, "Session recovered from checkpoint");
            return Ok(snapshot);
        }

        if let Some(state) = self.load_session(session_id).await? {
            info!(session_id, "No checkpoint; recovered from saved record");
            return Ok(state);
        }

        Err(PilotError::NothingToRecover(session_id.to_string()))
    }

    /// First session for the mission that has not reached Completion.
    ///
    /// At most one active session per mission is assumed; this is not
    /// lock-enforced (single-process use).
    pub async fn find_active_session(&self, mission_id: &str) -> Result<Option<SessionState>> {
        let cached = {
            let cache = self.cache.read();
            cache
                .values()
                .filter(|s| s.mission_id == mission_id && s.is_active())
                .min_by_key(|s| s.timestamp)
                .cloned()
        };
        if cached.is_some() {
            return Ok(cached);
        }

        let sessions = self.store.list().await?;
        Ok(sessions
            .into_iter()
            .find(|s| s.mission_id == mission_id && s.is_active()))
    }

    /// All durably stored sessions, unfiltered.
    pub async fn list_sessions(&self) -> Result<Vec<SessionState>> {
        self.store.list().await
    }

    async fn require(&self, session_id: &str) -> Result<SessionState> {
        self.load_session(session_id)
            .await?
            .ok_or_else(|| PilotError::SessionNotFound(session_id.to_string()))
    }

    async fn mutate(
        &self,
        session_id: &str,
        apply: impl FnOnce(&mut SessionState),
    ) -> Result<SessionState> {
        let mut state = self.require(session_id).await?;
        apply(&mut state);
        self.save_session(&state).await?;
        Ok(state)
    }
}
