use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mission::Mission;
use crate::progress::ProgressTracker;
use crate::session::{ArtifactKind, SessionState};

/// Outcome of one `orchestrate()` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionReport {
    pub mission_id: String,
    pub session_id: String,
    pub success: bool,
    pub iterations: u32,
    pub total_criteria: usize,
    pub completed_criteria: usize,
    pub completion_percentage: u8,
    pub artifacts_by_kind: HashMap<ArtifactKind, usize>,
    pub error_count: usize,
    pub recovery_count: u64,
}

impl MissionReport {
    pub fn build(mission: &Mission, session: &SessionState) -> Self {
        let progress = ProgressTracker::calculate_progress(mission);
        Self {
            mission_id: mission.id.clone(),
            session_id: session.session_id.clone(),
            success: ProgressTracker::check_completion(mission),
            iterations: session.iterations,
            total_criteria: progress.total_criteria,
            completed_criteria: progress.completed_criteria,
            completion_percentage: progress.completion_percentage,
            artifacts_by_kind: session.artifact_counts_by_kind(),
            error_count: session.errors.len(),
            recovery_count: session
                .metadata
                .get("recoveries")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{DodCriterion, Priority};
    use crate::session::Artifact;

    #[test]
    fn test_report_metrics() {
        let mission = crate::mission::Mission::new("m-1", "acme/widgets", "t", "d")
            .with_criterion(DodCriterion::new("c-1", "a", Priority::Critical));
        let mut session = SessionState::new("m-1", "acme/widgets", "inst-1");
        session.iterations = 4;
        session
            .artifacts
            .push(Artifact::new(ArtifactKind::Code, "src/a.rs", "x"));
        session
            .artifacts
            .push(Artifact::new(ArtifactKind::Code, "src/b.rs", "y"));
        session
            .artifacts
            .push(Artifact::new(ArtifactKind::Test, "tests/a.rs", "z"));
        session
            .metadata
            .insert("recoveries".into(), serde_json::json!(2));

        let report = MissionReport::build(&mission, &session);
        assert!(!report.success);
        assert_eq!(report.iterations, 4);
        assert_eq!(report.artifacts_by_kind[&ArtifactKind::Code], 2);
        assert_eq!(report.artifacts_by_kind[&ArtifactKind::Test], 1);
        assert_eq!(report.recovery_count, 2);
        assert_eq!(report.completion_percentage, 0);
    }
}
