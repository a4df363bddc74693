//! Coding agent: the code-execution collaborator.
//!
//! The orchestrator hands the agent a free-text action plan plus an
//! execution context and gets back a report with any produced artifacts.
//! Implementations live outside the core; the subprocess adapter here is
//! the production binding the CLI wires up.

mod command;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::ArtifactKind;

pub use command::CommandAgent;

/// Context handed to the agent alongside an action plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub working_directory: PathBuf,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Previously produced artifacts as (path, truncated content preview).
    #[serde(default)]
    pub previous_artifacts: Vec<(String, String)>,
}

/// A file the agent produced or modified while executing a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentArtifact {
    #[serde(default)]
    pub kind: ArtifactKind,
    pub path: String,
    pub content: String,
}

/// Outcome of executing one action plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionReport {
    pub success: bool,
    pub output: String,
    pub artifacts: Vec<AgentArtifact>,
    pub session_ended: bool,
    pub token_usage: u64,
    pub error: Option<String>,
}

#[async_trait]
pub trait CodingAgent: Send + Sync {
    /// Execute a free-text action plan.
    async fn execute(&self, plan: &str, context: &ExecutionContext) -> Result<ExecutionReport>;

    /// Check the execution environment before any work starts. A `false`
    /// here aborts orchestration without retry.
    async fn validate_environment(&self) -> Result<bool>;

    /// Begin a logical sub-session scoped to one orchestration run.
    async fn start_session(&self, _session_id: &str) -> Result<()> {
        Ok(())
    }

    async fn end_session(&self) -> Result<()> {
        Ok(())
    }
}
