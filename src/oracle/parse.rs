//! Oracle reply parsing and the documented fallback policies.
//!
//! Each reply kind has a parse function producing a tagged [`OracleReply`]
//! and a separately named fallback policy applied when the reply is not
//! valid JSON. The fallbacks are part of the contract: a misbehaving oracle
//! degrades the loop, it does not stop it.

use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{Analysis, OracleReply, RecoveryVerdict, ValidationVerdict};

/// Attempt strict JSON first, then a fenced ```json block, then the
/// outermost brace-delimited span. Oracles wrap JSON in prose often enough
/// that all three are needed in practice.
fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(inner) = extract_fenced_block(trimmed)
        && let Ok(value) = serde_json::from_str(inner)
    {
        return Some(value);
    }

    if let Some(start) = trimmed.find('{')
        && let Some(end) = trimmed.rfind('}')
        && start < end
        && let Ok(value) = serde_json::from_str(&trimmed[start..=end])
    {
        return Some(value);
    }

    None
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')?;
    let body = &after_fence[body_start + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

pub fn parse_analysis(raw: &str) -> OracleReply<Analysis> {
    match parse_json(raw) {
        Some(analysis) => OracleReply::Parsed(analysis),
        None => {
            debug!("Analysis reply was not JSON; applying continue fallback");
            OracleReply::Fallback(raw.to_string())
        }
    }
}

pub fn parse_validation(raw: &str) -> OracleReply<ValidationVerdict> {
    match parse_json(raw) {
        Some(verdict) => OracleReply::Parsed(verdict),
        None => {
            debug!("Validation reply was not JSON; applying keyword fallback");
            OracleReply::Fallback(raw.to_string())
        }
    }
}

pub fn parse_recovery(raw: &str) -> OracleReply<RecoveryVerdict> {
    match parse_json(raw) {
        Some(verdict) => OracleReply::Parsed(verdict),
        None => {
            debug!("Recovery reply was not JSON; assuming recoverable");
            OracleReply::Fallback(raw.to_string())
        }
    }
}

/// Fallback policy for analysis replies: a default "continue" summary.
pub fn continue_analysis() -> Analysis {
    Analysis {
        current_status: Some("continue".to_string()),
        recommendations: vec!["Continue with the next pending criterion".to_string()],
        ..Analysis::default()
    }
}

/// Fallback policy for validation replies: naive keyword scan of the raw
/// text for "complete" / "success".
pub fn keyword_validation(raw: &str) -> ValidationVerdict {
    let lowered = raw.to_lowercase();
    let completed = lowered.contains("complete") || lowered.contains("success");
    ValidationVerdict {
        completed,
        evidence: completed.then(|| raw.trim().to_string()),
        reason: Some("fallback keyword match".to_string()),
        confidence: None,
    }
}

/// Fallback policy for recovery replies: assume recoverable, with the raw
/// text as the recovery action.
pub fn assume_recoverable(raw: &str) -> RecoveryVerdict {
    RecoveryVerdict {
        can_recover: true,
        strategy: Some("oracle-freeform".to_string()),
        recovery_action: Some(raw.trim().to_string()),
        reason: None,
    }
}

impl OracleReply<Analysis> {
    pub fn into_verdict(self) -> Analysis {
        match self {
            Self::Parsed(analysis) => analysis,
            Self::Fallback(_) => continue_analysis(),
        }
    }
}

impl OracleReply<ValidationVerdict> {
    pub fn into_verdict(self) -> ValidationVerdict {
        match self {
            Self::Parsed(verdict) => verdict,
            Self::Fallback(raw) => keyword_validation(&raw),
        }
    }
}

impl OracleReply<RecoveryVerdict> {
    pub fn into_verdict(self) -> RecoveryVerdict {
        match self {
            Self::Parsed(verdict) => verdict,
            Self::Fallback(raw) => assume_recoverable(&raw),
        }
    }
}
