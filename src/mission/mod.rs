//! Mission data model and mission sources.
//!
//! A mission is the unit of work: a description plus an ordered set of
//! definition-of-done criteria. Sources parse external mission documents
//! (YAML files) into the model; the rest of the crate trusts their output.

mod source;
mod types;

pub use source::{MissionSource, YamlMissionSource};
pub use types::{DodCriterion, Mission, Priority};
