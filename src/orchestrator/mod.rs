//! Mission-execution control loop.
//!
//! The engine resolves or creates a session, then iterates
//! Planning -> Execution -> Validation passes until the completion policy is
//! satisfied or the iteration budget runs out, checkpointing along the way.
//! Iteration failures are routed through the recovery oracle; unrecoverable
//! faults unwind with a best-effort final checkpoint.

mod engine;
mod report;

pub use engine::Orchestrator;
pub use report::MissionReport;
