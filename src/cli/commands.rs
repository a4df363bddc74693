use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dod-pilot",
    about = "Drive a mission toward its definition of done via external planning and coding agents",
    version
)]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// State directory (session records, checkpoints, config.toml)
    #[arg(long, global = true, default_value = ".dod-pilot")]
    pub state_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the orchestration loop for a mission file
    Run {
        /// Path to the mission YAML document
        mission: PathBuf,

        /// Override the configured iteration budget
        #[arg(long)]
        max_iterations: Option<u32>,
    },

    /// Show progress and completion state for a mission file
    Status {
        /// Path to the mission YAML document
        mission: PathBuf,
    },

    /// List all stored sessions
    Sessions,

    /// Restore a session from its newest checkpoint
    Recover {
        /// Session id to recover
        session_id: String,
    },
}
