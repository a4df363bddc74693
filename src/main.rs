use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dod_pilot::agent::CommandAgent;
use dod_pilot::cli::{Cli, Commands, Display};
use dod_pilot::config::PilotConfig;
use dod_pilot::error::Result;
use dod_pilot::mission::{MissionSource, YamlMissionSource};
use dod_pilot::oracle::CommandOracle;
use dod_pilot::orchestrator::Orchestrator;
use dod_pilot::progress::ProgressTracker;
use dod_pilot::session::{FsSessionStore, SessionManager};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dod_pilot=debug")
    } else {
        EnvFilter::new("dod_pilot=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let state_dir = cli.state_dir.clone();
    let config = PilotConfig::load(&state_dir).await?;

    match cli.command {
        Commands::Run {
            mission,
            max_iterations,
        } => {
            let mut config = config;
            if let Some(budget) = max_iterations {
                config.orchestrator.max_iterations = budget;
            }
            config.validate()?;

            let mut mission = YamlMissionSource::new(&mission).load().await?;
            let orchestrator = build_orchestrator(&state_dir, &config).await?;
            let report = orchestrator.orchestrate(&mut mission).await?;
            display.print_report(&report);
        }
        Commands::Status { mission } => {
            let mission = YamlMissionSource::new(&mission).load().await?;
            display.print_mission_status(&mission);

            if let Some(session) = build_sessions(&state_dir, &config)
                .await?
                .find_active_session(&mission.id)
                .await?
            {
                let avg = Duration::from_secs(config.orchestrator.avg_secs_per_criterion);
                let remaining =
                    ProgressTracker::estimate_time_remaining(&mission, &session, avg);
                display.print_session_summary(&session);
                println!("    estimated remaining: {}s", remaining.as_secs());
            }
        }
        Commands::Sessions => {
            let sessions = build_sessions(&state_dir, &config).await?.list_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions stored.");
            }
            for session in sessions {
                display.print_session_summary(&session);
            }
        }
        Commands::Recover { session_id } => {
            let recovered = build_sessions(&state_dir, &config)
                .await?
                .recover(&session_id)
                .await?;
            display.print_session_summary(&recovered);
        }
    }

    Ok(())
}

async fn build_sessions(state_dir: &Path, config: &PilotConfig) -> Result<SessionManager> {
    let store = FsSessionStore::new(state_dir);
    store.init().await?;

    let instance_id = config
        .storage
        .instance_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    Ok(SessionManager::new(Arc::new(store), instance_id))
}

async fn build_orchestrator(state_dir: &Path, config: &PilotConfig) -> Result<Orchestrator> {
    let sessions = build_sessions(state_dir, config).await?;
    let oracle = Arc::new(CommandOracle::new(config.oracle.clone()));
    let agent = Arc::new(CommandAgent::new(config.agent.clone()));

    Ok(Orchestrator::new(
        config.orchestrator.clone(),
        config.execution.clone(),
        sessions,
        oracle,
        agent,
    ))
}
