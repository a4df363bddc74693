//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: formatted terminal output

mod commands;
mod display;

pub use commands::{Cli, Commands};
pub use display::Display;
