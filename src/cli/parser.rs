//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// context-seeker: answer questions by first asking an oracle for the
/// missing context.
#[derive(Parser, Debug)]
#[command(name = "context-seeker")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory holding instruction overrides (`stopping.md`, `query.md`,
    /// `answer.md`, `oracle.md`).
    #[arg(long, env = "SEEKER_PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the agent signatures derived from a base signature.
    ///
    /// Does not contact any provider.
    #[command(after_help = r#"Examples:
  context-seeker signatures "question -> answer: float"
  context-seeker --format json signatures "question, unit -> answer"
"#)]
    Signatures {
        /// Base signature, e.g. `"question -> answer: float"`.
        signature: String,
    },

    /// Answer one example, consulting an oracle for follow-up questions.
    #[command(after_help = r#"Examples:
  context-seeker ask "question -> answer: float" \
      --input question="How many golf balls fit in all the oceans?" \
      --privileged-file facts.txt
  context-seeker ask "question -> answer" -i question="..." --human-oracle
"#)]
    Ask {
        /// Base signature, e.g. `"question -> answer: float"`.
        signature: String,

        /// Input field value as `name=value`; repeat for each input.
        #[arg(short, long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,

        /// Privileged context handed to the oracle.
        #[arg(long, conflicts_with = "privileged_file")]
        privileged_context: Option<String>,

        /// Read the privileged context from a file.
        #[arg(long)]
        privileged_file: Option<PathBuf>,

        /// Maximum follow-up questions (overrides `SEEKER_BUDGET`).
        #[arg(short, long, allow_negative_numbers = true)]
        budget: Option<i64>,

        /// Model for the seeker agents (overrides `SEEKER_MODEL`).
        #[arg(long)]
        model: Option<String>,

        /// Model for the oracle (overrides `SEEKER_ORACLE_MODEL`).
        #[arg(long)]
        oracle_model: Option<String>,

        /// Answer follow-up questions yourself on the terminal.
        #[arg(long)]
        human_oracle: bool,

        /// With `--human-oracle`, also print the privileged context.
        #[arg(long, requires = "human_oracle")]
        show_privileged: bool,
    },

    /// Write the default instruction files for editing.
    ///
    /// Existing files are left untouched.
    #[command(after_help = r#"Examples:
  context-seeker init-prompts                       # ~/.config/context-seeker/prompts
  context-seeker init-prompts ./prompts -s "question, unit -> answer"
"#)]
    InitPrompts {
        /// Target directory (defaults to `~/.config/context-seeker/prompts`).
        dir: Option<PathBuf>,

        /// Base signature the default instructions are derived from.
        #[arg(short, long, default_value = "question -> answer")]
        signature: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "context-seeker",
            "ask",
            "question -> answer",
            "-i",
            "question=why?",
            "--privileged-context",
            "facts",
            "--budget",
            "-1",
        ])
        .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Commands::Ask {
                inputs,
                privileged_context,
                budget,
                ..
            } => {
                assert_eq!(inputs, ["question=why?"]);
                assert_eq!(privileged_context.as_deref(), Some("facts"));
                assert_eq!(budget, Some(-1));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_privileged_sources_conflict() {
        let result = Cli::try_parse_from([
            "context-seeker",
            "ask",
            "question -> answer",
            "--privileged-context",
            "a",
            "--privileged-file",
            "b.txt",
        ]);
        assert!(result.is_err());
    }
}
