use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::DecisionOracle;
use crate::config::OracleConfig;
use crate::error::{PilotError, Result};

/// Oracle bound to an external command.
///
/// The prompt is written to the child's stdin; stdout is the reply. A
/// non-zero exit or an expired timeout is an oracle transport failure.
pub struct CommandOracle {
    config: OracleConfig,
}

impl CommandOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DecisionOracle for CommandOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PilotError::Oracle(format!("failed to spawn {}: {}", self.config.command, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| PilotError::Oracle(format!("failed to write prompt: {}", e)))?;
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                PilotError::Timeout(format!(
                    "oracle command after {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| PilotError::Oracle(format!("oracle command failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PilotError::Oracle(format!(
                "oracle command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let reply = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = reply.len(), "Oracle reply received");
        Ok(reply)
    }
}
