//! Configuration loading and validation.
//!
//! All tunables are injected through these structs at construction time;
//! components never read process environment or other ambient globals
//! directly.

mod settings;

pub use settings::{
    AgentConfig, ExecutionConfig, OracleConfig, OrchestratorConfig, PilotConfig, StorageConfig,
};
