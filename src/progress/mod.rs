//! Completion-policy engine.
//!
//! Pure, stateless computation over a mission snapshot: progress metrics,
//! the two-tier priority-gated completion policy, next-criterion selection
//! and remaining-time estimation. Nothing here touches storage.

mod tracker;

pub use tracker::{MissionProgress, ProgressTracker};
