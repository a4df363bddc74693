use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Control-loop phase of a session.
///
/// One iteration walks Planning -> Execution -> Validation and loops back to
/// Planning. Any phase may drop into ErrorRecovery; Completion is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Initialization,
    Planning,
    Execution,
    Validation,
    ErrorRecovery,
    Completion,
}

impl SessionPhase {
    pub fn allowed_transitions(&self) -> &'static [SessionPhase] {
        use SessionPhase::*;
        match self {
            Initialization => &[Planning, ErrorRecovery, Completion],
            Planning => &[Execution, ErrorRecovery, Completion],
            Execution => &[Validation, ErrorRecovery],
            Validation => &[Planning, ErrorRecovery, Completion],
            // A recovered session re-enters the loop here; scheduling treats
            // this as equivalent to Planning.
            ErrorRecovery => &[Planning, ErrorRecovery, Completion],
            Completion => &[],
        }
    }

    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completion)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialization => "Initialization",
            Self::Planning => "Planning",
            Self::Execution => "Execution",
            Self::Validation => "Validation",
            Self::ErrorRecovery => "ErrorRecovery",
            Self::Completion => "Completion",
        };
        write!(f, "{}", s)
    }
}

/// One resumable execution attempt against a mission.
///
/// The durable copy owned by the session manager is authoritative across
/// restarts; the orchestrator's in-memory copy is a write-through cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub mission_id: String,
    pub repository: String,
    pub instance_id: String,
    pub current_phase: SessionPhase,

    /// Criterion ids validated as satisfied, in completion order.
    #[serde(default)]
    pub completed_tasks: Vec<String>,

    /// Work queue surfaced to the planning prompt. Holds criterion ids plus
    /// any recovery actions injected at the front by error handling.
    #[serde(default)]
    pub pending_tasks: Vec<String>,

    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    #[serde(default)]
    pub errors: Vec<SessionError>,

    #[serde(default)]
    pub iterations: u32,

    /// Session creation time.
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkpoint: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SessionState {
    pub fn new(
        mission_id: impl Into<String>,
        repository: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            mission_id: mission_id.into(),
            repository: repository.into(),
            instance_id: instance_id.into(),
            current_phase: SessionPhase::Initialization,
            completed_tasks: Vec::new(),
            pending_tasks: Vec::new(),
            artifacts: Vec::new(),
            errors: Vec::new(),
            iterations: 0,
            timestamp: Utc::now(),
            last_checkpoint: None,
            metadata: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.current_phase != SessionPhase::Completion
    }

    /// Next per-path monotonic version for an artifact at `path`.
    pub fn next_artifact_version(&self, path: &str) -> u32 {
        self.artifacts.iter().filter(|a| a.path == path).count() as u32 + 1
    }

    pub fn artifact_counts_by_kind(&self) -> HashMap<ArtifactKind, usize> {
        let mut counts = HashMap::new();
        for artifact in &self.artifacts {
            *counts.entry(artifact.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn unresolved_error_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.resolved).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Doc,
    Test,
    Config,
    #[default]
    Other,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Doc => "doc",
            Self::Test => "test",
            Self::Config => "config",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// A file produced by the coding agent during an iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub kind: ArtifactKind,
    pub path: String,
    pub content: String,
    /// Per-path monotonic, starting at 1.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        let content = content.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            path: path.into(),
            checksum: Some(format!("{:08x}", crc32fast::hash(content.as_bytes()))),
            content,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An error recorded against a session. Never auto-resolved by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionError {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl SessionError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind: kind.into(),
            message: message.into(),
            stack: None,
            resolved: false,
            resolution: None,
        }
    }
}
