use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{PilotError, Result};
use crate::mission::{DodCriterion, Mission, Priority};
use crate::session::SessionState;
use crate::utils::ratio_to_percent_u8;

/// Snapshot of mission progress at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionProgress {
    pub total_criteria: usize,
    pub completed_criteria: usize,
    pub critical_criteria: usize,
    pub critical_completed: usize,
    pub completion_percentage: u8,
    pub phase_label: String,
}

impl std::fmt::Display for MissionProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}% ({}/{}) - {}",
            self.completion_percentage, self.completed_criteria, self.total_criteria,
            self.phase_label
        )
    }
}

pub struct ProgressTracker;

impl ProgressTracker {
    pub fn calculate_progress(mission: &Mission) -> MissionProgress {
        let total = mission.definition_of_done.len();
        let completed = mission
            .definition_of_done
            .iter()
            .filter(|c| c.completed)
            .count();
        let critical: Vec<&DodCriterion> = mission
            .definition_of_done
            .iter()
            .filter(|c| c.priority == Priority::Critical)
            .collect();

        let percentage = if total > 0 {
            ratio_to_percent_u8(completed as f64 / total as f64)
        } else {
            0
        };

        MissionProgress {
            total_criteria: total,
            completed_criteria: completed,
            critical_criteria: critical.len(),
            critical_completed: critical.iter().filter(|c| c.completed).count(),
            completion_percentage: percentage,
            phase_label: Self::phase_label(percentage).to_string(),
        }
    }

    fn phase_label(percentage: u8) -> &'static str {
        match percentage {
            0 => "Initialization",
            1..=24 => "Early Development",
            25..=49 => "Core Implementation",
            50..=74 => "Feature Completion",
            75..=99 => "Final Validation",
            _ => "Complete",
        }
    }

    /// Two-tier completion policy, evaluated in strict order:
    ///
    /// 1. an empty criteria list never completes;
    /// 2. any incomplete CRITICAL criterion blocks completion;
    /// 3. all criteria complete passes;
    /// 4. otherwise good-enough: every CRITICAL and HIGH criterion complete
    ///    (MEDIUM/LOW may remain open). With no CRITICAL/HIGH criteria at
    ///    all this tier falls through to requiring full completion.
    pub fn check_completion(mission: &Mission) -> bool {
        let criteria = &mission.definition_of_done;
        if criteria.is_empty() {
            return false;
        }

        if criteria
            .iter()
            .any(|c| c.priority == Priority::Critical && !c.completed)
        {
            return false;
        }

        if criteria.iter().all(|c| c.completed) {
            return true;
        }

        let gating: Vec<&DodCriterion> = criteria
            .iter()
            .filter(|c| matches!(c.priority, Priority::Critical | Priority::High))
            .collect();

        !gating.is_empty() && gating.iter().all(|c| c.completed)
    }

    /// Return a new mission with only the named criterion marked complete.
    pub fn mark_criterion_complete(
        mission: &Mission,
        criterion_id: &str,
        evidence: Option<String>,
    ) -> Result<Mission> {
        if mission.criterion(criterion_id).is_none() {
            return Err(PilotError::CriterionNotFound {
                mission_id: mission.id.clone(),
                criterion_id: criterion_id.to_string(),
            });
        }

        let mut updated = mission.clone();
        for criterion in &mut updated.definition_of_done {
            if criterion.id == criterion_id {
                criterion.completed = true;
                criterion.completed_at = Some(Utc::now());
                criterion.evidence = evidence;
                break;
            }
        }
        Ok(updated)
    }

    /// First incomplete criterion scanning CRITICAL, HIGH, MEDIUM, LOW in
    /// order; first-occurrence-wins within a tier.
    pub fn next_priority_criterion(mission: &Mission) -> Option<&DodCriterion> {
        Priority::TIERS.iter().find_map(|tier| {
            mission
                .definition_of_done
                .iter()
                .find(|c| c.priority == *tier && !c.completed)
        })
    }

    pub fn pending_criteria(mission: &Mission) -> Vec<&DodCriterion> {
        mission
            .definition_of_done
            .iter()
            .filter(|c| !c.completed)
            .collect()
    }

    pub fn completed_criteria(mission: &Mission) -> Vec<&DodCriterion> {
        mission
            .definition_of_done
            .iter()
            .filter(|c| c.completed)
            .collect()
    }

    /// Estimate remaining wall-clock time from the session's observed pace.
    ///
    /// Falls back to `avg_time_per_criterion` before anything has completed
    /// so a fresh session never divides by zero.
    pub fn estimate_time_remaining(
        mission: &Mission,
        session: &SessionState,
        avg_time_per_criterion: Duration,
    ) -> Duration {
        let pending = Self::pending_criteria(mission).len() as u32;
        if pending == 0 {
            return Duration::ZERO;
        }

        let completed = Self::completed_criteria(mission).len() as u32;
        if completed == 0 {
            return avg_time_per_criterion * pending;
        }

        let elapsed = (Utc::now() - session.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed / completed * pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{DodCriterion, Priority};

    fn mission_with(criteria: Vec<DodCriterion>) -> Mission {
        let mut mission = Mission::new("m-001", "acme/widgets", "t", "d");
        mission.definition_of_done = criteria;
        mission
    }

    fn done(mut c: DodCriterion) -> DodCriterion {
        c.completed = true;
        c.completed_at = Some(Utc::now());
        c
    }

    #[test]
    fn test_empty_dod_never_completes() {
        let mission = mission_with(vec![]);
        assert!(!ProgressTracker::check_completion(&mission));
    }

    #[test]
    fn test_all_complete() {
        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::Low)),
            done(DodCriterion::new("c-2", "b", Priority::Medium)),
        ]);
        assert!(ProgressTracker::check_completion(&mission));
    }

    #[test]
    fn test_incomplete_critical_blocks() {
        let mission = mission_with(vec![
            DodCriterion::new("c-1", "a", Priority::Critical),
            done(DodCriterion::new("c-2", "b", Priority::High)),
            done(DodCriterion::new("c-3", "c", Priority::Low)),
        ]);
        assert!(!ProgressTracker::check_completion(&mission));
    }

    #[test]
    fn test_good_enough_by_priority() {
        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::Critical)),
            done(DodCriterion::new("c-2", "b", Priority::High)),
            DodCriterion::new("c-3", "c", Priority::Medium),
            DodCriterion::new("c-4", "d", Priority::Low),
        ]);
        assert!(ProgressTracker::check_completion(&mission));
    }

    #[test]
    fn test_no_gating_criteria_requires_full_completion() {
        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::Medium)),
            DodCriterion::new("c-2", "b", Priority::Low),
        ]);
        assert!(!ProgressTracker::check_completion(&mission));
    }

    #[test]
    fn test_next_criterion_priority_order() {
        let mission = mission_with(vec![
            DodCriterion::new("c-low", "a", Priority::Low),
            DodCriterion::new("c-high-1", "b", Priority::High),
            DodCriterion::new("c-crit", "c", Priority::Critical),
            DodCriterion::new("c-high-2", "d", Priority::High),
        ]);

        let next = ProgressTracker::next_priority_criterion(&mission).unwrap();
        assert_eq!(next.id, "c-crit");

        let mission = ProgressTracker::mark_criterion_complete(&mission, "c-crit", None).unwrap();
        let next = ProgressTracker::next_priority_criterion(&mission).unwrap();
        // Stable within the HIGH tier: first occurrence wins.
        assert_eq!(next.id, "c-high-1");
    }

    #[test]
    fn test_next_criterion_none_when_all_done() {
        let mission = mission_with(vec![done(DodCriterion::new("c-1", "a", Priority::High))]);
        assert!(ProgressTracker::next_priority_criterion(&mission).is_none());
    }

    #[test]
    fn test_mark_complete_does_not_touch_others() {
        let mission = mission_with(vec![
            DodCriterion::new("c-1", "a", Priority::High),
            DodCriterion::new("c-2", "b", Priority::High),
        ]);

        let updated =
            ProgressTracker::mark_criterion_complete(&mission, "c-1", Some("tests pass".into()))
                .unwrap();

        let c1 = updated.criterion("c-1").unwrap();
        assert!(c1.completed);
        assert!(c1.completed_at.is_some());
        assert_eq!(c1.evidence.as_deref(), Some("tests pass"));

        let c2 = updated.criterion("c-2").unwrap();
        assert!(!c2.completed);
        assert!(c2.completed_at.is_none());
        assert!(c2.evidence.is_none());
    }

    #[test]
    fn test_mark_complete_unknown_id() {
        let mission = mission_with(vec![DodCriterion::new("c-1", "a", Priority::High)]);
        let err = ProgressTracker::mark_criterion_complete(&mission, "c-404", None).unwrap_err();
        assert!(matches!(err, PilotError::CriterionNotFound { .. }));
    }

    #[test]
    fn test_progress_percentages() {
        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::High)),
            DodCriterion::new("c-2", "b", Priority::High),
            DodCriterion::new("c-3", "c", Priority::Low),
        ]);
        assert_eq!(
            ProgressTracker::calculate_progress(&mission).completion_percentage,
            33
        );

        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::High)),
            done(DodCriterion::new("c-2", "b", Priority::High)),
            DodCriterion::new("c-3", "c", Priority::Low),
            DodCriterion::new("c-4", "d", Priority::Low),
        ]);
        assert_eq!(
            ProgressTracker::calculate_progress(&mission).completion_percentage,
            50
        );

        let empty = mission_with(vec![]);
        assert_eq!(
            ProgressTracker::calculate_progress(&empty).completion_percentage,
            0
        );
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(ProgressTracker::phase_label(0), "Initialization");
        assert_eq!(ProgressTracker::phase_label(10), "Early Development");
        assert_eq!(ProgressTracker::phase_label(25), "Core Implementation");
        assert_eq!(ProgressTracker::phase_label(50), "Feature Completion");
        assert_eq!(ProgressTracker::phase_label(75), "Final Validation");
        assert_eq!(ProgressTracker::phase_label(100), "Complete");
    }

    #[test]
    fn test_critical_counts() {
        let mission = mission_with(vec![
            done(DodCriterion::new("c-1", "a", Priority::Critical)),
            DodCriterion::new("c-2", "b", Priority::Critical),
            DodCriterion::new("c-3", "c", Priority::Low),
        ]);
        let progress = ProgressTracker::calculate_progress(&mission);
        assert_eq!(progress.critical_criteria, 2);
        assert_eq!(progress.critical_completed, 1);
    }

    #[test]
    fn test_estimate_time_remaining() {
        let session = SessionState::new("m-001", "acme/widgets", "inst-1");
        let avg = Duration::from_secs(60);

        // Nothing pending.
        let mission = mission_with(vec![done(DodCriterion::new("c-1", "a", Priority::High))]);
        assert_eq!(
            ProgressTracker::estimate_time_remaining(&mission, &session, avg),
            Duration::ZERO
        );

        // Nothing completed yet: fall back to the supplied average.
        let mission = mission_with(vec![
            DodCriterion::new("c-1", "a", Priority::High),
            DodCriterion::new("c-2", "b", Priority::High),
        ]);
        assert_eq!(
            ProgressTracker::estimate_time_remaining(&mission, &session, avg),
            Duration::from_secs(120)
        );
    }
}
