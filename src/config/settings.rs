use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{PilotError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub orchestrator: OrchestratorConfig,
    pub oracle: OracleConfig,
    pub agent: AgentConfig,
    pub execution: ExecutionConfig,
    pub storage: StorageConfig,
}

impl PilotConfig {
    /// Load `config.toml` from the state directory, falling back to
    /// defaults when absent.
    pub async fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join("config.toml");
        let config: Self = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.orchestrator.max_iterations == 0 {
            errors.push("orchestrator.max_iterations must be greater than 0");
        }
        if self.orchestrator.checkpoint_interval == 0 {
            errors.push("orchestrator.checkpoint_interval must be greater than 0");
        }
        if self.orchestrator.artifact_preview_chars == 0 {
            errors.push("orchestrator.artifact_preview_chars must be greater than 0");
        }
        if self.oracle.command.is_empty() {
            errors.push("oracle.command must not be empty");
        }
        if self.oracle.timeout_secs == 0 {
            errors.push("oracle.timeout_secs must be greater than 0");
        }
        if self.agent.command.is_empty() {
            errors.push("agent.command must not be empty");
        }
        if self.agent.timeout_secs == 0 {
            errors.push("agent.timeout_secs must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PilotError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Iteration budget for one `orchestrate()` run.
    pub max_iterations: u32,
    /// Periodic checkpoint cadence, in iterations.
    pub checkpoint_interval: u32,
    /// Character cap on artifact content previews handed to the agent.
    pub artifact_preview_chars: usize,
    /// Seed estimate used before any criterion has completed.
    pub avg_secs_per_criterion: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            checkpoint_interval: 5,
            artifact_preview_chars: 500,
            avg_secs_per_criterion: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["-p".to_string()],
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "dod-agent".to_string(),
            args: Vec::new(),
            timeout_secs: 1800,
        }
    }
}

/// Execution context shared with the coding agent each iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub working_directory: PathBuf,
    pub environment: HashMap<String, String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            environment: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of durable state (session records, checkpoints, config).
    pub state_dir: PathBuf,
    /// Stable identifier stamped on sessions created by this process;
    /// generated when absent.
    pub instance_id: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".dod-pilot"),
            instance_id: None,
        }
    }
}
