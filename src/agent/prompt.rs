//! Prompt rendering for predictors and instruction overrides.
//!
//! A [`FieldContract`] is rendered into a system prompt that lists the
//! input and output fields and asks for a single JSON object. Input records
//! are rendered into the user message with each field's display prefix.
//! [`InstructionSet`] lets tuned instructions live in markdown files.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::agent::traits::AgentRole;
use crate::context::ContextLog;
use crate::error::AgentError;
use crate::record::Record;
use crate::signature::{FieldContract, FieldType, REASONING_FIELD};

/// Default instruction directory relative to the home directory.
const DEFAULT_PROMPT_DIR: &str = ".config/context-seeker/prompts";

/// Renders the system prompt for a contract.
#[must_use]
pub fn build_system_prompt(contract: &FieldContract) -> String {
    let mut prompt = String::from("Your input fields are:\n");
    for (i, field) in contract.input_fields().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. `{}` ({}): {}",
            i + 1,
            field.name,
            field.ty,
            field.description
        );
    }

    prompt.push_str("\nYour output fields are:\n");
    let _ = writeln!(
        prompt,
        "1. `{REASONING_FIELD}` (str): Think step by step before producing the outputs."
    );
    for (i, field) in contract.output_fields().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. `{}` ({}): {}",
            i + 2,
            field.name,
            field.ty,
            field.description
        );
    }

    let keys: Vec<String> = std::iter::once(REASONING_FIELD)
        .chain(contract.output_names())
        .map(|name| format!("\"{name}\""))
        .collect();
    let _ = write!(
        prompt,
        "\nRespond with a single JSON object whose keys are, in order: {}.\n\
         Booleans must be JSON true/false; numbers must be JSON numbers.\n\n\
         In adhering to this structure, your objective is:\n{}",
        keys.join(", "),
        contract.instructions()
    );
    prompt
}

/// Renders an input record into the user message for a contract.
#[must_use]
pub fn build_user_prompt(contract: &FieldContract, inputs: &Record) -> String {
    let mut prompt = String::new();
    for field in contract.input_fields() {
        let rendered = inputs
            .get(&field.name)
            .map_or_else(String::new, |value| render_value(field.ty, value));
        let _ = writeln!(prompt, "{}\n{rendered}\n", field.prefix);
    }
    prompt.push_str("Respond with the JSON object now.");
    prompt
}

/// Renders a demonstration output as the assistant turn of a few-shot pair.
#[must_use]
pub fn build_demo_reply(contract: &FieldContract, outputs: &Record) -> String {
    let demo: Record = contract
        .output_names()
        .filter_map(|name| outputs.get(name).map(|v| (name.to_string(), v.clone())))
        .collect();
    serde_json::to_string(&demo).unwrap_or_else(|_| "{}".to_string())
}

fn render_value(ty: FieldType, value: &Value) -> String {
    match (ty, value) {
        (FieldType::ContextLog, v) => {
            ContextLog::from_value(v).map_or_else(|| v.to_string(), |log| log.to_string())
        }
        (_, Value::String(s)) => s.clone(),
        (_, Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map_or_else(|| format!("- {item}"), |s| format!("- {s}"))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        (_, other) => other.to_string(),
    }
}

/// Parses a completion into a record.
///
/// Accepts a bare JSON object or one wrapped in a markdown code block.
///
/// # Errors
///
/// Returns [`AgentError::ResponseParse`] if the content is not a JSON object.
pub fn parse_completion(content: &str) -> Result<Record, AgentError> {
    let trimmed = content.trim();

    // Handle markdown code blocks
    let json_str = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => Ok(Record::from(map)),
        Ok(other) => Err(AgentError::ResponseParse {
            message: format!("expected a JSON object, got {}", json_kind(&other)),
            content: content.to_string(),
        }),
        Err(e) => Err(AgentError::ResponseParse {
            message: format!("invalid JSON: {e}"),
            content: content.to_string(),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Per-role instruction overrides loaded from markdown files.
///
/// Each role reads `<role>.md` (`stopping.md`, `query.md`, `answer.md`,
/// `oracle.md`). Missing or empty files leave the derived default
/// instruction in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    /// Stopping agent instructions.
    pub stopping: Option<String>,
    /// Query agent instructions.
    pub query: Option<String>,
    /// Answer agent instructions.
    pub answer: Option<String>,
    /// Oracle instructions.
    pub oracle: Option<String>,
}

impl InstructionSet {
    /// Loads overrides from the given directory.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `SEEKER_PROMPT_DIR` environment variable
    /// 3. `~/.config/context-seeker/prompts/`
    ///
    /// Each file is loaded independently.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("SEEKER_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |role: AgentRole| -> Option<String> {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(file_name(role)))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        };

        Self {
            stopping: load_file(AgentRole::Stopping),
            query: load_file(AgentRole::Query),
            answer: load_file(AgentRole::Answer),
            oracle: load_file(AgentRole::Oracle),
        }
    }

    /// The default instruction directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }

    /// Override for a role, if any.
    #[must_use]
    pub fn get(&self, role: AgentRole) -> Option<&str> {
        match role {
            AgentRole::Stopping => self.stopping.as_deref(),
            AgentRole::Query => self.query.as_deref(),
            AgentRole::Answer => self.answer.as_deref(),
            AgentRole::Oracle => self.oracle.as_deref(),
        }
    }

    /// Applies the override for `role` to `contract`, if one exists.
    #[must_use]
    pub fn apply(&self, role: AgentRole, contract: FieldContract) -> FieldContract {
        match self.get(role) {
            Some(text) => contract.with_instructions(text),
            None => contract,
        }
    }

    /// Writes each contract's current instructions to `<role>.md` in `dir`.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten; use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(
        dir: &Path,
        contracts: &[(AgentRole, &FieldContract)],
    ) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (role, contract) in contracts {
            let path = dir.join(file_name(*role));
            if path.exists() {
                continue;
            }
            std::fs::write(&path, format!("{}\n", contract.instructions()))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn file_name(role: AgentRole) -> String {
    format!("{}.md", role.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ContractBuilder;
    use serde_json::json;

    fn stopping_contract() -> FieldContract {
        let base: FieldContract = "question -> answer"
            .parse()
            .unwrap_or_else(|_| unreachable!());
        ContractBuilder::new(&base)
            .stopping()
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_build_system_prompt() {
        let prompt = build_system_prompt(&stopping_contract());
        assert!(prompt.contains("1. `question` (str)"));
        assert!(prompt.contains("2. `context` (list[tuple[str, str]])"));
        assert!(prompt.contains("2. `ready` (bool): Whether to stop clarifying."));
        assert!(prompt.contains(r#""reasoning", "ready""#));
        assert!(prompt.ends_with("produce the fields `ready`."));
    }

    #[test]
    fn test_build_user_prompt_renders_context() {
        let mut log = ContextLog::new();
        log.push("What is the volume of the oceans?", "1.3e9");
        let inputs = Record::new()
            .with("question", "How many golf balls?")
            .with("context", log.to_value());
        let prompt = build_user_prompt(&stopping_contract(), &inputs);
        assert!(prompt.contains("Question:\nHow many golf balls?"));
        assert!(prompt.contains("Context:\n[1] Q: What is the volume of the oceans?"));
        assert!(prompt.contains("[1] A: 1.3e9"));
    }

    #[test]
    fn test_build_demo_reply_keeps_outputs_only() {
        let outputs = Record::new().with("question", "ignored").with("ready", true);
        let reply = build_demo_reply(&stopping_contract(), &outputs);
        assert_eq!(reply, r#"{"ready":true}"#);
    }

    #[test]
    fn test_parse_completion() {
        let record = parse_completion(r#"{"reasoning": "r", "ready": false}"#)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(record.get("ready"), Some(&json!(false)));
    }

    #[test]
    fn test_parse_completion_code_block() {
        let record = parse_completion("```json\n{\"answer\": \"3.2e13\"}\n```")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(record.get_str("answer"), Some("3.2e13"));
    }

    #[test]
    fn test_parse_completion_rejects_non_objects() {
        assert!(matches!(
            parse_completion("[1, 2]"),
            Err(AgentError::ResponseParse { .. })
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(AgentError::ResponseParse { .. })
        ));
    }

    #[test]
    fn test_instruction_set_load_and_apply() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("stopping.md"), "Stop once volumes are known.\n")
            .unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("query.md"), "   \n").unwrap_or_else(|_| unreachable!());

        let set = InstructionSet::load(Some(dir.path()));
        assert_eq!(set.get(AgentRole::Stopping), Some("Stop once volumes are known."));
        assert_eq!(set.get(AgentRole::Query), None);
        assert_eq!(set.get(AgentRole::Oracle), None);

        let applied = set.apply(AgentRole::Stopping, stopping_contract());
        assert_eq!(applied.instructions(), "Stop once volumes are known.");
        let untouched = set.apply(AgentRole::Answer, stopping_contract());
        assert_eq!(untouched.instructions(), stopping_contract().instructions());
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("stopping.md"), "custom")
            .unwrap_or_else(|_| unreachable!());
        let contract = stopping_contract();

        let written = InstructionSet::write_defaults(
            dir.path(),
            &[(AgentRole::Stopping, &contract), (AgentRole::Query, &contract)],
        )
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(written, vec![dir.path().join("query.md")]);
        let kept = std::fs::read_to_string(dir.path().join("stopping.md")).unwrap_or_default();
        assert_eq!(kept, "custom");
    }
}
