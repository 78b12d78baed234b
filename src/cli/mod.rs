//! CLI layer for context-seeker.
//!
//! Provides the command-line interface using clap, with commands for
//! inspecting derived signatures, answering a question end to end, and
//! scaffolding instruction overrides.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
