use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::report::MissionReport;
use crate::agent::{CodingAgent, ExecutionContext};
use crate::config::{ExecutionConfig, OrchestratorConfig};
use crate::error::{PilotError, Result};
use crate::mission::Mission;
use crate::oracle::{
    analysis_prompt, parse_analysis, parse_recovery, parse_validation, plan_prompt,
    recovery_prompt, validation_prompt, DecisionOracle,
};
use crate::progress::ProgressTracker;
use crate::session::{Artifact, SessionError, SessionManager, SessionPhase, SessionState};
use crate::utils::truncate_chars;

const RECOVERY_COUNTER_KEY: &str = "recoveries";

/// Outcome of one Planning -> Execution -> Validation pass.
enum IterationOutcome {
    /// The pass ran; the loop condition decides whether to continue.
    Progressed,
    /// No criterion remained; the session moved to Completion.
    Completed,
}

/// Drives a mission toward its definition of done.
///
/// The engine exclusively owns the in-memory mission and session for the
/// duration of one `orchestrate()` call; every mutation is written through
/// the session manager before it is relied upon.
pub struct Orchestrator {
    config: OrchestratorConfig,
    execution: ExecutionConfig,
    sessions: SessionManager,
    oracle: Arc<dyn DecisionOracle>,
    agent: Arc<dyn CodingAgent>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        execution: ExecutionConfig,
        sessions: SessionManager,
        oracle: Arc<dyn DecisionOracle>,
        agent: Arc<dyn CodingAgent>,
    ) -> Self {
        Self {
            config,
            execution,
            sessions,
            oracle,
            agent,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run the control loop until the completion policy is satisfied, the
    /// iteration budget is exhausted, or an unrecoverable fault unwinds.
    ///
    /// A fault escaping the loop is recorded as an unresolved session error
    /// and re-raised after a best-effort final checkpoint; budget exhaustion
    /// is not a fault and yields a report with `success = false`.
    pub async fn orchestrate(&self, mission: &mut Mission) -> Result<MissionReport> {
        let mut session = self.resolve_session(mission).await?;
        if mission.started_at.is_none() {
            mission.started_at = Some(Utc::now());
        }

        info!(
            mission_id = mission.id,
            session_id = session.session_id,
            iterations = session.iterations,
            "Orchestration starting"
        );

        match self.run_loop(mission, &mut session).await {
            Ok(()) => {
                let report = MissionReport::build(mission, &session);
                if report.success && mission.completed_at.is_none() {
                    mission.completed_at = Some(Utc::now());
                }
                info!(
                    mission_id = mission.id,
                    success = report.success,
                    iterations = report.iterations,
                    percentage = report.completion_percentage,
                    "Orchestration finished"
                );
                Ok(report)
            }
            Err(error) => {
                self.record_fatal(&mut session, &error).await;
                Err(error)
            }
        }
    }

    /// Resume the mission's active session, or create one seeded with the
    /// incomplete criterion ids as its pending work queue.
    async fn resolve_session(&self, mission: &Mission) -> Result<SessionState> {
        if let Some(session) = self.sessions.find_active_session(&mission.id).await? {
            info!(
                session_id = session.session_id,
                phase = %session.current_phase,
                "Resuming active session"
            );
            return Ok(session);
        }

        let mut session = self
            .sessions
            .create_session(&mission.id, &mission.repository)
            .await?;
        session.pending_tasks = mission
            .definition_of_done
            .iter()
            .filter(|c| !c.completed)
            .map(|c| c.id.clone())
            .collect();
        self.sessions.save_session(&session).await?;
        Ok(session)
    }

    async fn run_loop(&self, mission: &mut Mission, session: &mut SessionState) -> Result<()> {
        if !self.agent.validate_environment().await? {
            return Err(PilotError::EnvironmentValidation(
                "coding agent reported an unusable environment".into(),
            ));
        }

        self.agent.start_session(&session.session_id).await?;

        while !ProgressTracker::check_completion(mission)
            && session.iterations < self.config.max_iterations
        {
            match self.execute_iteration(mission, session).await {
                Ok(IterationOutcome::Completed) => break,
                Ok(IterationOutcome::Progressed) => {}
                Err(error) => self.handle_iteration_error(mission, session, error).await?,
            }

            if session.iterations > 0 && session.iterations % self.config.checkpoint_interval == 0
            {
                *session = self.sessions.checkpoint(&session.session_id).await?;
            }
        }

        // Unconditional final checkpoint regardless of how the loop exited.
        *session = self.sessions.checkpoint(&session.session_id).await?;

        if let Err(error) = self.agent.end_session().await {
            warn!(error = %error, "Failed to end agent sub-session");
        }

        Ok(())
    }

    /// One Planning -> Execution -> Validation pass.
    async fn execute_iteration(
        &self,
        mission: &mut Mission,
        session: &mut SessionState,
    ) -> Result<IterationOutcome> {
        // A session recovered from a checkpoint enters here in ErrorRecovery;
        // scheduling treats that the same as Planning.
        *session = self
            .sessions
            .update_phase(&session.session_id, SessionPhase::Planning)
            .await?;

        let progress = ProgressTracker::calculate_progress(mission);
        let raw = self
            .oracle
            .complete(&analysis_prompt(mission, session, &progress))
            .await?;
        let analysis = parse_analysis(&raw).into_verdict();
        debug!(
            status = analysis.current_status.as_deref().unwrap_or("unknown"),
            blockers = analysis.blockers.len(),
            "Oracle analysis"
        );

        let Some(criterion) = ProgressTracker::next_priority_criterion(mission).cloned() else {
            *session = self
                .sessions
                .update_phase(&session.session_id, SessionPhase::Completion)
                .await?;
            return Ok(IterationOutcome::Completed);
        };

        info!(
            criterion_id = criterion.id,
            priority = %criterion.priority,
            iteration = session.iterations,
            "Targeting criterion"
        );

        let plan = self
            .oracle
            .complete(&plan_prompt(mission, &criterion, &session.pending_tasks))
            .await?;

        *session = self
            .sessions
            .update_phase(&session.session_id, SessionPhase::Execution)
            .await?;

        let context = self.execution_context(session);
        let report = self.agent.execute(&plan, &context).await?;

        // Artifacts are persisted even when execution failed; partial output
        // is still part of the audit trail.
        for produced in &report.artifacts {
            let artifact = Artifact::new(produced.kind, &produced.path, &produced.content);
            *session = self
                .sessions
                .add_artifact(&session.session_id, artifact)
                .await?;
        }

        if !report.success {
            let message = report
                .error
                .clone()
                .unwrap_or_else(|| truncate_chars(&report.output, 500));
            return Err(PilotError::AgentExecution(message));
        }

        *session = self
            .sessions
            .update_phase(&session.session_id, SessionPhase::Validation)
            .await?;

        let raw = self
            .oracle
            .complete(&validation_prompt(mission, &criterion, &report.output))
            .await?;
        let verdict = parse_validation(&raw).into_verdict();

        if verdict.completed {
            *mission =
                ProgressTracker::mark_criterion_complete(mission, &criterion.id, verdict.evidence)?;
            session.completed_tasks.push(criterion.id.clone());
            session.pending_tasks.retain(|task| task != &criterion.id);
            info!(criterion_id = criterion.id, "Criterion validated complete");
        } else {
            debug!(
                criterion_id = criterion.id,
                reason = verdict.reason.as_deref().unwrap_or("none given"),
                "Criterion not yet satisfied"
            );
        }

        session.iterations += 1;
        self.sessions.save_session(session).await?;
        Ok(IterationOutcome::Progressed)
    }

    /// Consult the recovery oracle about an iteration failure.
    ///
    /// Recoverable: the suggested action is prepended to the pending work
    /// queue and the loop continues. Unrecoverable (or oracle transport
    /// failure): the original error unwinds to `orchestrate()`.
    async fn handle_iteration_error(
        &self,
        mission: &Mission,
        session: &mut SessionState,
        error: PilotError,
    ) -> Result<()> {
        warn!(error = %error, iteration = session.iterations, "Iteration failed");

        *session = self
            .sessions
            .update_phase(&session.session_id, SessionPhase::ErrorRecovery)
            .await?;
        *session = self
            .sessions
            .add_error(
                &session.session_id,
                SessionError::new(error.kind(), error.to_string()),
            )
            .await?;

        let raw = self
            .oracle
            .complete(&recovery_prompt(mission, session, &error))
            .await?;
        let verdict = parse_recovery(&raw).into_verdict();

        if !verdict.can_recover {
            warn!(
                reason = verdict.reason.as_deref().unwrap_or("none given"),
                "Oracle declared failure unrecoverable"
            );
            return Err(error);
        }

        let action = verdict
            .recovery_action
            .or(verdict.strategy)
            .unwrap_or_else(|| format!("Recover from: {}", error));
        info!(action = action.as_str(), "Injecting recovery action");

        session.pending_tasks.insert(0, action);
        let recoveries = session
            .metadata
            .get(RECOVERY_COUNTER_KEY)
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        session.metadata.insert(
            RECOVERY_COUNTER_KEY.to_string(),
            serde_json::json!(recoveries + 1),
        );
        self.sessions.save_session(session).await?;
        Ok(())
    }

    /// Best-effort error record and final checkpoint before re-raising.
    async fn record_fatal(&self, session: &mut SessionState, error: &PilotError) {
        // The recovery path records the failure itself; a session left in
        // ErrorRecovery already carries this error.
        if session.current_phase != SessionPhase::ErrorRecovery {
            match self
                .sessions
                .add_error(
                    &session.session_id,
                    SessionError::new(error.kind(), error.to_string()),
                )
                .await
            {
                Ok(updated) => *session = updated,
                Err(persist) => warn!(error = %persist, "Failed to record fatal error"),
            }
        }

        if let Err(persist) = self.sessions.checkpoint(&session.session_id).await {
            warn!(error = %persist, "Final checkpoint failed");
        }
    }

    fn execution_context(&self, session: &SessionState) -> ExecutionContext {
        ExecutionContext {
            working_directory: self.execution.working_directory.clone(),
            environment: self.execution.environment.clone(),
            previous_artifacts: session
                .artifacts
                .iter()
                .map(|a| {
                    (
                        a.path.clone(),
                        truncate_chars(&a.content, self.config.artifact_preview_chars),
                    )
                })
                .collect(),
        }
    }
}
