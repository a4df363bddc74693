pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod mission;
pub mod oracle;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod utils;

pub use agent::{CodingAgent, ExecutionContext, ExecutionReport};
pub use config::PilotConfig;
pub use error::{PilotError, Result};
pub use mission::{DodCriterion, Mission, MissionSource, Priority, YamlMissionSource};
pub use oracle::DecisionOracle;
pub use orchestrator::{MissionReport, Orchestrator};
pub use progress::{MissionProgress, ProgressTracker};
pub use session::{
    Artifact, ArtifactKind, FsSessionStore, SessionManager, SessionPhase, SessionState,
};
