use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{CodingAgent, ExecutionContext, ExecutionReport};
use crate::config::AgentConfig;
use crate::error::{PilotError, Result};

/// Coding agent bound to an external command.
///
/// The plan and context are written to stdin as one JSON document; stdout
/// must be a JSON [`ExecutionReport`]. Environment validation runs the same
/// command with a `--validate` flag and succeeds on exit code 0.
pub struct CommandAgent {
    config: AgentConfig,
}

#[derive(Serialize)]
struct AgentRequest<'a> {
    plan: &'a str,
    context: &'a ExecutionContext,
}

impl CommandAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    async fn run(&self, extra_args: &[&str], stdin_body: Option<String>) -> Result<std::process::Output> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .args(extra_args)
            .stdin(if stdin_body.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PilotError::AgentExecution(format!(
                    "failed to spawn {}: {}",
                    self.config.command, e
                ))
            })?;

        if let Some(body) = stdin_body
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(body.as_bytes())
                .await
                .map_err(|e| PilotError::AgentExecution(format!("failed to write request: {}", e)))?;
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PilotError::Timeout(format!("agent command after {}s", self.config.timeout_secs))
            })?
            .map_err(|e| PilotError::AgentExecution(format!("agent command failed: {}", e)))
    }
}

#[async_trait]
impl CodingAgent for CommandAgent {
    async fn execute(&self, plan: &str, context: &ExecutionContext) -> Result<ExecutionReport> {
        let request = serde_json::to_string(&AgentRequest { plan, context })?;
        let output = self.run(&[], Some(request)).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PilotError::AgentExecution(format!(
                "agent exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let report: ExecutionReport = serde_json::from_slice(&output.stdout)?;
        debug!(
            success = report.success,
            artifacts = report.artifacts.len(),
            tokens = report.token_usage,
            "Agent report received"
        );
        Ok(report)
    }

    async fn validate_environment(&self) -> Result<bool> {
        let output = self.run(&["--validate"], None).await?;
        Ok(output.status.success())
    }
}
