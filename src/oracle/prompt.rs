//! Prompt builders for the decision oracle.
//!
//! Prompts carry mission context first, then the current question, then the
//! expected JSON shape. Long free-text fields are truncated so a chatty
//! mission document cannot crowd out the question.

use crate::error::PilotError;
use crate::mission::{DodCriterion, Mission};
use crate::progress::MissionProgress;
use crate::session::SessionState;
use crate::utils::truncate_chars;

const DESCRIPTION_BUDGET: usize = 1500;
const CONTEXT_BUDGET: usize = 1000;
const ERROR_BUDGET: usize = 800;
const MAX_LISTED_TASKS: usize = 10;

fn mission_header(mission: &Mission) -> String {
    let mut header = format!(
        "# Mission: {} ({})\n\nRepository: {}\n\n{}",
        mission.title,
        mission.id,
        mission.repository,
        truncate_chars(&mission.description, DESCRIPTION_BUDGET),
    );

    if let Some(context) = &mission.context {
        header.push_str(&format!(
            "\n\n## Context\n\n{}",
            truncate_chars(context, CONTEXT_BUDGET)
        ));
    }

    if !mission.constraints.is_empty() {
        header.push_str("\n\n## Constraints\n");
        for constraint in &mission.constraints {
            header.push_str(&format!("\n- {}", constraint));
        }
    }

    header
}

fn criteria_table(mission: &Mission) -> String {
    mission
        .definition_of_done
        .iter()
        .map(|c| {
            format!(
                "- [{}] {} ({}): {}",
                if c.completed { "x" } else { " " },
                c.id,
                c.priority,
                c.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Planning-time analysis of the current situation.
pub fn analysis_prompt(
    mission: &Mission,
    session: &SessionState,
    progress: &MissionProgress,
) -> String {
    format!(
        r#"{header}

## Definition of Done

{criteria}

## Session

Iteration: {iteration}
Phase: {phase}
Progress: {progress}
Unresolved errors: {errors}

## Question

Analyze the current state of this mission. Reply with JSON:
{{"currentStatus": "...", "blockers": [], "recommendations": [], "nextSteps": [], "confidence": 0.0}}"#,
        header = mission_header(mission),
        criteria = criteria_table(mission),
        iteration = session.iterations,
        phase = session.current_phase,
        progress = progress,
        errors = session.unresolved_error_count(),
    )
}

/// Concrete action plan targeting one criterion. Pending tasks (including
/// any injected recovery actions) are surfaced in order so recovery work
/// leads the plan.
pub fn plan_prompt(mission: &Mission, criterion: &DodCriterion, pending_tasks: &[String]) -> String {
    let pending = if pending_tasks.is_empty() {
        "(none)".to_string()
    } else {
        pending_tasks
            .iter()
            .take(MAX_LISTED_TASKS)
            .enumerate()
            .map(|(i, task)| format!("{}. {}", i + 1, task))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"{header}

## Target Criterion

{id} ({priority}): {description}

## Pending Work Queue

{pending}

## Question

Produce a concrete, self-contained action plan a coding agent can execute to
satisfy the target criterion. Address the head of the pending work queue
first if it is a recovery action. Reply with plain text."#,
        header = mission_header(mission),
        id = criterion.id,
        priority = criterion.priority,
        description = criterion.description,
        pending = pending,
    )
}

/// Verdict on whether the targeted criterion is satisfied after execution.
pub fn validation_prompt(
    mission: &Mission,
    criterion: &DodCriterion,
    execution_output: &str,
) -> String {
    format!(
        r#"{header}

## Criterion Under Validation

{id} ({priority}): {description}
Measurable: {measurable}

## Execution Output

{output}

## Question

Is this criterion now satisfied? Reply with JSON:
{{"completed": true/false, "evidence": "...", "reason": "...", "confidence": 0.0}}"#,
        header = mission_header(mission),
        id = criterion.id,
        priority = criterion.priority,
        description = criterion.description,
        measurable = criterion.measurable,
        output = truncate_chars(execution_output, DESCRIPTION_BUDGET),
    )
}

/// Recovery consultation after an iteration failure.
pub fn recovery_prompt(mission: &Mission, session: &SessionState, error: &PilotError) -> String {
    format!(
        r#"{header}

## Failure

Kind: {kind}
Iteration: {iteration}
Error: {message}

## Question

Can this mission recover from the failure? Reply with JSON:
{{"canRecover": true/false, "strategy": "...", "recoveryAction": "...", "reason": "..."}}"#,
        header = mission_header(mission),
        kind = error.kind(),
        iteration = session.iterations,
        message = truncate_chars(&error.to_string(), ERROR_BUDGET),
    )
}
