use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Invalid mission: {0}")]
    InvalidMission(String),

    #[error("Criterion not found: {mission_id}/{criterion_id}")]
    CriterionNotFound {
        mission_id: String,
        criterion_id: String,
    },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No checkpoint or saved record for session: {0}")]
    NothingToRecover(String),

    #[error("Environment validation failed: {0}")]
    EnvironmentValidation(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Agent execution failed: {0}")]
    AgentExecution(String),

    #[error("Unrecoverable iteration failure: {0}")]
    Unrecoverable(String),

    #[error("State persistence failed: {0}")]
    StatePersistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl PilotError {
    /// Short stable identifier used when recording an error on a session.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissionNotFound(_) => "mission_not_found",
            Self::InvalidMission(_) => "invalid_mission",
            Self::CriterionNotFound { .. } => "criterion_not_found",
            Self::SessionNotFound(_) => "session_not_found",
            Self::NothingToRecover(_) => "nothing_to_recover",
            Self::EnvironmentValidation(_) => "environment_validation",
            Self::Oracle(_) => "oracle",
            Self::AgentExecution(_) => "agent_execution",
            Self::Unrecoverable(_) => "unrecoverable",
            Self::StatePersistence(_) => "state_persistence",
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
            Self::Json(_) => "json",
            Self::Toml(_) => "toml",
            Self::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;
