use console::{Style, style};

use crate::mission::Mission;
use crate::orchestrator::MissionReport;
use crate::progress::{MissionProgress, ProgressTracker};
use crate::session::{SessionPhase, SessionState};
use crate::utils::truncate_chars;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("error:").bold().red(), message);
    }

    pub fn print_mission_status(&self, mission: &Mission) {
        self.print_header(&format!("Mission: {} ({})", mission.title, mission.id));

        println!("Repository:  {}", mission.repository);
        println!(
            "Description: {}",
            truncate_chars(&mission.description, 120)
        );

        let progress = ProgressTracker::calculate_progress(mission);
        println!();
        println!(
            "Progress: {} {}% ({}/{})  [{}]",
            self.progress_bar(progress.completion_percentage, 30),
            progress.completion_percentage,
            progress.completed_criteria,
            progress.total_criteria,
            progress.phase_label,
        );
        println!(
            "Complete by policy: {}",
            self.bool_style(ProgressTracker::check_completion(mission))
        );

        println!();
        for criterion in &mission.definition_of_done {
            let mark = if criterion.completed {
                style("✓").green()
            } else {
                style("·").dim()
            };
            println!(
                "  {} {} ({})  {}",
                mark,
                style(&criterion.id).bold(),
                criterion.priority,
                truncate_chars(&criterion.description, 80)
            );
        }
        println!();
    }

    pub fn print_progress(&self, progress: &MissionProgress) {
        println!(
            "{} {}",
            self.progress_bar(progress.completion_percentage, 30),
            progress
        );
    }

    pub fn print_session_summary(&self, session: &SessionState) {
        println!(
            "{}  mission={}  phase={}  iterations={}  errors={}",
            style(&session.session_id).bold(),
            session.mission_id,
            self.phase_style(session.current_phase)
                .apply_to(session.current_phase.to_string()),
            session.iterations,
            session.errors.len(),
        );
        if let Some(at) = session.last_checkpoint {
            println!("    last checkpoint: {}", style(at).dim());
        }
    }

    pub fn print_report(&self, report: &MissionReport) {
        self.print_header("Orchestration Report");

        let outcome = if report.success {
            style("SUCCESS").bold().green()
        } else {
            style("INCOMPLETE").bold().yellow()
        };
        println!("Outcome:    {}", outcome);
        println!("Iterations: {}", report.iterations);
        println!(
            "Criteria:   {}/{} ({}%)",
            report.completed_criteria, report.total_criteria, report.completion_percentage
        );

        if !report.artifacts_by_kind.is_empty() {
            let mut kinds: Vec<_> = report.artifacts_by_kind.iter().collect();
            kinds.sort_by_key(|(kind, _)| kind.to_string());
            let summary = kinds
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Artifacts:  {}", summary);
        }

        println!(
            "Errors:     {} ({} recovered)",
            report.error_count, report.recovery_count
        );
        println!();
    }

    fn progress_bar(&self, percentage: u8, width: usize) -> String {
        let filled = width * percentage as usize / 100;
        format!(
            "[{}{}]",
            style("█".repeat(filled)).green(),
            style("░".repeat(width - filled)).dim()
        )
    }

    fn bool_style(&self, value: bool) -> console::StyledObject<&'static str> {
        if value {
            style("yes").green()
        } else {
            style("no").yellow()
        }
    }

    fn phase_style(&self, phase: SessionPhase) -> Style {
        match phase {
            SessionPhase::Completion => Style::new().green(),
            SessionPhase::ErrorRecovery => Style::new().red(),
            _ => Style::new().cyan(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
