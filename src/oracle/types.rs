use serde::{Deserialize, Serialize};

/// How an oracle reply was interpreted.
///
/// `Parsed` carries a well-formed JSON verdict; `Fallback` carries the raw
/// reply text that a lenient policy was applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply<T> {
    Parsed(T),
    Fallback(String),
}

impl<T> OracleReply<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Planning-time situation analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Analysis {
    pub current_status: Option<String>,
    pub blockers: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
    pub confidence: Option<f64>,
}

/// Verdict on whether the targeted criterion is now satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub completed: bool,
    pub evidence: Option<String>,
    pub reason: Option<String>,
    pub confidence: Option<f64>,
}

/// Verdict on whether an iteration failure can be recovered from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecoveryVerdict {
    pub can_recover: bool,
    pub strategy: Option<String>,
    pub recovery_action: Option<String>,
    pub reason: Option<String>,
}
