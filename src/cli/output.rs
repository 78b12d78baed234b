//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;

use crate::agent::AgentRole;
use crate::seeker::Prediction;
use crate::signature::FieldContract;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything unrecognized is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON followed by a newline.
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}\n"))
    }
}

#[derive(Serialize)]
struct ContractView<'a> {
    role: &'a str,
    signature: String,
    instructions: &'a str,
    contract: &'a FieldContract,
}

/// Renders the base contract and each derived contract.
#[must_use]
pub fn format_signatures(
    base: &FieldContract,
    derived: &[(AgentRole, &FieldContract)],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("{:<9} {base}\n", "base:");
            for (role, contract) in derived {
                let label = format!("{role}:");
                let _ = writeln!(output, "{label:<9} {contract}");
                let _ = writeln!(output, "{:<9} {}", "", contract.instructions());
            }
            output
        }
        OutputFormat::Json => {
            let views: Vec<ContractView<'_>> = derived
                .iter()
                .map(|(role, contract)| ContractView {
                    role: role.as_str(),
                    signature: contract.to_string(),
                    instructions: contract.instructions(),
                    contract,
                })
                .collect();
            format.to_json(&serde_json::json!({
                "base": base.to_string(),
                "agents": views,
            }))
        }
    }
}

/// Renders a prediction: output fields, then the gathered context.
#[must_use]
pub fn format_prediction(
    prediction: &Prediction,
    signature: &FieldContract,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for name in signature.output_names() {
                let value = prediction
                    .get(name)
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    .unwrap_or_default();
                let _ = writeln!(output, "{name}: {value}");
            }
            let _ = write!(
                output,
                "\n---\nFollow-up questions: {}\n{}\n",
                prediction.questions_asked(),
                prediction.context
            );
            output
        }
        OutputFormat::Json => format.to_json(prediction),
    }
}
