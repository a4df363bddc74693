use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};

use super::SessionState;
use crate::error::Result;

/// Durable key-value storage for sessions.
///
/// One record per session id plus an append-only, timestamp-keyed checkpoint
/// history per session id. Implementations must round-trip timestamps
/// exactly.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, state: &SessionState) -> Result<()>;
    async fn get(&self, session_id: &str) -> Result<Option<SessionState>>;
    async fn list(&self) -> Result<Vec<SessionState>>;

    /// Append an immutable snapshot keyed by (session id, `at`).
    async fn put_checkpoint(&self, state: &SessionState, at: DateTime<Utc>) -> Result<()>;
    async fn latest_checkpoint(&self, session_id: &str) -> Result<Option<SessionState>>;
    async fn list_checkpoints(&self, session_id: &str) -> Result<Vec<SessionState>>;
}

/// Filesystem-backed session store.
///
/// Layout:
///   sessions/{session_id}.yaml
///   sessions/checkpoints/{session_id}-{timestamp}.yaml
///
/// Records are written via temp file + atomic rename. Checkpoint filenames
/// embed a sortable timestamp so the newest snapshot is found by filename
/// ordering without loading every file.
pub struct FsSessionStore {
    sessions_dir: PathBuf,
    checkpoints_dir: PathBuf,
}

impl FsSessionStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let sessions_dir = state_dir.as_ref().join("sessions");
        let checkpoints_dir = sessions_dir.join("checkpoints");
        Self {
            sessions_dir,
            checkpoints_dir,
        }
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.checkpoints_dir).await?;
        self.recover_interrupted_writes().await;
        Ok(())
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(format!("{}.yaml", session_id))
    }

    fn checkpoint_path(&self, session_id: &str, at: DateTime<Utc>) -> PathBuf {
        let stamp = at.format("%Y%m%dT%H%M%S%9fZ");
        self.checkpoints_dir
            .join(format!("{}-{}.yaml", session_id, stamp))
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("yaml.tmp");
        fs::write(&tmp_path, content).await?;

        let tmp_clone = tmp_path.clone();
        let sync_result = tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_clone).and_then(|file| file.sync_all())
        })
        .await;
        match sync_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to sync temp file to disk"),
            Err(e) => warn!(error = %e, "Failed to sync temp file to disk"),
        }

        fs::rename(&tmp_path, path).await?;
        debug!(path = %path.display(), "Atomic write completed");
        Ok(())
    }

    async fn recover_interrupted_writes(&self) {
        for dir in [&self.sessions_dir, &self.checkpoints_dir] {
            if let Ok(mut entries) = fs::read_dir(dir).await {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "tmp") {
                        debug!(path = %path.display(), "Removing interrupted write");
                        let _ = fs::remove_file(&path).await;
                    }
                }
            }
        }
    }

    async fn read_state(&self, path: &Path) -> Result<SessionState> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_yaml_bw::from_str(&content)?)
    }

    /// Checkpoint filenames for a session, newest first.
    async fn checkpoint_names_desc(&self, session_id: &str) -> Result<Vec<String>> {
        if !self.checkpoints_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}-", session_id);
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.checkpoints_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "yaml")
                && let Some(name) = path.file_stem().and_then(|s| s.to_str())
                && name.starts_with(&prefix)
            {
                names.push(name.to_string());
            }
        }

        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn put(&self, state: &SessionState) -> Result<()> {
        fs::create_dir_all(&self.sessions_dir).await?;
        let content = serde_yaml_bw::to_string(state)?;
        self.write_atomic(&self.session_path(&state.session_id), &content)
            .await
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionState>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_state(&path).await.map(Some)
    }

    async fn list(&self) -> Result<Vec<SessionState>> {
        let mut sessions = Vec::new();
        if !self.sessions_dir.exists() {
            return Ok(sessions);
        }

        let mut entries = fs::read_dir(&self.sessions_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == "yaml")
                && let Ok(state) = self.read_state(&path).await
            {
                sessions.push(state);
            }
        }

        sessions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(sessions)
    }

    async fn put_checkpoint(&self, state: &SessionState, at: DateTime<Utc>) -> Result<()> {
        fs::create_dir_all(&self.checkpoints_dir).await?;
        let content = serde_yaml_bw::to_string(state)?;
        self.write_atomic(&self.checkpoint_path(&state.session_id, at), &content)
            .await
    }

    async fn latest_checkpoint(&self, session_id: &str) -> Result<Option<SessionState>> {
        let names = self.checkpoint_names_desc(session_id).await?;
        let Some(latest) = names.first() else {
            return Ok(None);
        };

        let path = self.checkpoints_dir.join(format!("{}.yaml", latest));
        match self.read_state(&path).await {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(checkpoint = latest.as_str(), error = %e, "Failed to load latest checkpoint");
                Ok(None)
            }
        }
    }

    async fn list_checkpoints(&self, session_id: &str) -> Result<Vec<SessionState>> {
        let mut snapshots = Vec::new();
        for name in self.checkpoint_names_desc(session_id).await? {
            let path = self.checkpoints_dir.join(format!("{}.yaml", name));
            if let Ok(state) = self.read_state(&path).await {
                snapshots.push(state);
            }
        }
        Ok(snapshots)
    }
}
