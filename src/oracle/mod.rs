//! Decision oracle: the planning/validation/recovery collaborator.
//!
//! The oracle consumes free-text prompts built from mission, session and
//! progress state and returns free text. The core attempts to parse each
//! reply as JSON and falls back to documented lenient interpretations when
//! parsing fails; those fallbacks are load-bearing behavior, not incidental.

mod command;
mod parse;
mod prompt;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use command::CommandOracle;
pub use parse::{parse_analysis, parse_recovery, parse_validation};
pub use prompt::{analysis_prompt, plan_prompt, recovery_prompt, validation_prompt};
pub use types::{Analysis, OracleReply, RecoveryVerdict, ValidationVerdict};

/// Free text in, free text out. Reply interpretation belongs to the core.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
