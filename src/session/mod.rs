//! Session persistence, checkpointing and recovery.
//!
//! A session is one resumable execution attempt against a mission. The
//! manager keeps the durable copy authoritative: every mutation is persisted
//! before it is relied upon, and checkpoints form an append-only history
//! used to resume after a restart.

mod manager;
mod state;
mod store;

pub use manager::SessionManager;
pub use state::{Artifact, ArtifactKind, SessionError, SessionPhase, SessionState};
pub use store::{FsSessionStore, SessionStore};
