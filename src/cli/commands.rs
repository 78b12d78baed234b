//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::agent::{
    AgentConfig, AgentRole, HumanOracle, InstructionSet, create_provider, oracle_contract,
};
use crate::cli::output::{OutputFormat, format_prediction, format_signatures};
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Error, Result};
use crate::record::Record;
use crate::seeker::ContextSeeker;
use crate::signature::{ContractBuilder, FieldContract, FieldType};

/// Parameters for the `ask` command.
struct AskParams<'a> {
    signature: &'a str,
    inputs: &'a [String],
    privileged_context: Option<&'a str>,
    privileged_file: Option<&'a Path>,
    budget: Option<i64>,
    model: Option<&'a str>,
    oracle_model: Option<&'a str>,
    human_oracle: bool,
    show_privileged: bool,
}

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let prompt_dir = cli.prompt_dir.as_deref();

    match &cli.command {
        Commands::Signatures { signature } => cmd_signatures(signature, prompt_dir, format),
        Commands::Ask {
            signature,
            inputs,
            privileged_context,
            privileged_file,
            budget,
            model,
            oracle_model,
            human_oracle,
            show_privileged,
        } => {
            let params = AskParams {
                signature,
                inputs,
                privileged_context: privileged_context.as_deref(),
                privileged_file: privileged_file.as_deref(),
                budget: *budget,
                model: model.as_deref(),
                oracle_model: oracle_model.as_deref(),
                human_oracle: *human_oracle,
                show_privileged: *show_privileged,
            };
            cmd_ask(&params, prompt_dir, format)
        }
        Commands::InitPrompts { dir, signature } => {
            cmd_init_prompts(dir.as_deref(), signature, format)
        }
    }
}

fn parse_signature(signature: &str) -> Result<FieldContract> {
    signature.parse()
}

/// Derived contracts for every role, with overrides from `instructions`.
fn role_contracts(
    signature: &FieldContract,
    instructions: &InstructionSet,
) -> Result<Vec<(AgentRole, FieldContract)>> {
    let set = ContractBuilder::new(signature).build()?;
    Ok(vec![
        (
            AgentRole::Stopping,
            instructions.apply(AgentRole::Stopping, set.stopping),
        ),
        (AgentRole::Query, instructions.apply(AgentRole::Query, set.query)),
        (
            AgentRole::Answer,
            instructions.apply(AgentRole::Answer, set.answer),
        ),
        (
            AgentRole::Oracle,
            instructions.apply(AgentRole::Oracle, oracle_contract()?),
        ),
    ])
}

fn cmd_signatures(
    signature: &str,
    prompt_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let base = parse_signature(signature)?;
    let instructions = InstructionSet::load(prompt_dir);
    let contracts = role_contracts(&base, &instructions)?;
    let borrowed: Vec<(AgentRole, &FieldContract)> =
        contracts.iter().map(|(role, c)| (*role, c)).collect();
    Ok(format_signatures(&base, &borrowed, format))
}

/// Parses `name=value` pairs against the base inputs.
///
/// Non-string fields accept JSON literals (`true`, `3`, `["a"]`); anything
/// that is not valid JSON is passed through as a string.
fn parse_inputs(signature: &FieldContract, pairs: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for pair in pairs {
        let (name, raw) = pair.split_once('=').ok_or_else(|| {
            CommandError::InvalidArgument(format!("expected NAME=VALUE, got `{pair}`"))
        })?;
        let name = name.trim();
        let field = signature
            .input_fields()
            .find(|f| f.name == name)
            .ok_or_else(|| {
                let known: Vec<&str> = signature.input_names().collect();
                CommandError::InvalidArgument(format!(
                    "`{name}` is not an input of the signature (inputs: {})",
                    known.join(", ")
                ))
            })?;
        let value = match field.ty {
            FieldType::Str => Value::String(raw.to_string()),
            _ => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        record.insert(name, value);
    }
    Ok(record)
}

fn read_privileged_context(params: &AskParams<'_>) -> Result<Option<String>> {
    if let Some(text) = params.privileged_context {
        return Ok(Some(text.to_string()));
    }
    params
        .privileged_file
        .map(|path| {
            std::fs::read_to_string(path).map_err(|e| {
                Error::from(CommandError::ExecutionFailed(format!(
                    "Failed to read privileged context from {}: {e}",
                    path.display()
                )))
            })
        })
        .transpose()
}

fn cmd_ask(params: &AskParams<'_>, prompt_dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let signature = parse_signature(params.signature)?;
    let inputs = parse_inputs(&signature, params.inputs)?;

    let privileged_context = match (read_privileged_context(params)?, params.human_oracle) {
        (Some(text), _) => text,
        (None, true) => String::new(),
        (None, false) => {
            return Err(CommandError::InvalidArgument(
                "--privileged-context or --privileged-file is required unless --human-oracle is set"
                    .to_string(),
            )
            .into());
        }
    };

    // Build agent configuration from env + CLI overrides
    let mut builder = AgentConfig::builder().from_env();
    if let Some(budget) = params.budget {
        builder = builder.budget(budget);
    }
    if let Some(model) = params.model {
        builder = builder.model(model);
    }
    if let Some(model) = params.oracle_model {
        builder = builder.oracle_model(model);
    }
    if let Some(dir) = prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let config = builder.build()?;

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let instructions = InstructionSet::load(config.prompt_dir.as_deref());

    let mut seeker = ContextSeeker::builder(signature.clone())
        .predictors(provider, &config)
        .instructions(instructions);
    if params.human_oracle {
        seeker = seeker.oracle(Arc::new(HumanOracle::stdio(params.show_privileged)));
    }
    let trainer = seeker.build_trainer()?;

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let prediction = rt.block_on(trainer.forward(&privileged_context, &inputs))?;
    Ok(format_prediction(&prediction, &signature, format))
}

fn cmd_init_prompts(dir: Option<&Path>, signature: &str, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(InstructionSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let base = parse_signature(signature)?;
    let contracts = role_contracts(&base, &InstructionSet::default())?;
    let borrowed: Vec<(AgentRole, &FieldContract)> =
        contracts.iter().map(|(role, c)| (*role, c)).collect();

    let written = InstructionSet::write_defaults(&target_dir, &borrowed).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write instruction files: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All instruction files already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} instruction file(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                );
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize agent instructions.\n");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}
