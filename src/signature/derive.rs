//! Derivation of the per-role contracts from a base task contract.
//!
//! Given a base contract `I -> O`:
//!
//! ```text
//! stopping:  I, context -> ready: bool
//! query:     I, context -> follow_up_question
//! answer:    I, context -> O
//! ```
//!
//! The base contract is never modified. Every derived contract receives the
//! deterministic default instruction for its field set.

use serde::Serialize;

use super::contract::FieldContract;
use super::field::{Field, FieldType};
use crate::error::{Error, Result};

/// Name of the accumulated context field added to every derived contract.
pub const CONTEXT_FIELD: &str = "context";
/// Output field of the stopping agent.
pub const READY_FIELD: &str = "ready";
/// Output field of the query agent.
pub const FOLLOW_UP_QUESTION_FIELD: &str = "follow_up_question";
/// Key of the step-by-step rationale every predictor emits before its
/// declared outputs.
pub const REASONING_FIELD: &str = "reasoning";

/// The three contracts derived from one base contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSet {
    /// `I, context -> ready`.
    pub stopping: FieldContract,
    /// `I, context -> follow_up_question`.
    pub query: FieldContract,
    /// `I, context -> O`.
    pub answer: FieldContract,
}

/// Derives role contracts from a borrowed base contract.
#[derive(Debug, Clone, Copy)]
pub struct ContractBuilder<'a> {
    base: &'a FieldContract,
}

impl<'a> ContractBuilder<'a> {
    /// Wraps the base task contract.
    #[must_use]
    pub const fn new(base: &'a FieldContract) -> Self {
        Self { base }
    }

    /// Derives all three contracts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the base contract already uses a
    /// name the derived contracts need (`context`, `reasoning`, or `ready` /
    /// `follow_up_question` among its inputs).
    pub fn build(&self) -> Result<ContractSet> {
        Ok(ContractSet {
            stopping: self.stopping()?,
            query: self.query()?,
            answer: self.answer()?,
        })
    }

    /// `I, context -> ready: bool`.
    pub fn stopping(&self) -> Result<FieldContract> {
        let mut fields = self.inputs_with_context()?;
        fields.push(
            Field::output(READY_FIELD, FieldType::Bool)
                .prefix("Ready:")
                .description("Whether to stop clarifying."),
        );
        FieldContract::new(fields).map_err(|e| self.collision(e))
    }

    /// `I, context -> follow_up_question`.
    pub fn query(&self) -> Result<FieldContract> {
        let mut fields = self.inputs_with_context()?;
        fields.push(
            Field::output(FOLLOW_UP_QUESTION_FIELD, FieldType::Str)
                .prefix("Follow-up Question:")
                .description("Clarifying question."),
        );
        FieldContract::new(fields).map_err(|e| self.collision(e))
    }

    /// `I, context -> O`.
    pub fn answer(&self) -> Result<FieldContract> {
        let mut fields = self.inputs_with_context()?;
        fields.extend(self.base.output_fields().cloned());
        FieldContract::new(fields).map_err(|e| self.collision(e))
    }

    fn inputs_with_context(&self) -> Result<Vec<Field>> {
        for reserved in [CONTEXT_FIELD, REASONING_FIELD] {
            if self.base.field(reserved).is_some() {
                return Err(Error::configuration(format!(
                    "base signature `{}` already defines a `{reserved}` field",
                    self.base
                )));
            }
        }
        let mut fields: Vec<Field> = self.base.input_fields().cloned().collect();
        fields.push(context_field());
        Ok(fields)
    }

    fn collision(&self, err: Error) -> Error {
        match err {
            Error::Configuration { message } => Error::configuration(format!(
                "cannot derive agent signature from `{}`: {message}",
                self.base
            )),
            other => other,
        }
    }
}

/// The `context` input field shared by all derived contracts.
#[must_use]
pub fn context_field() -> Field {
    Field::input(CONTEXT_FIELD, FieldType::ContextLog)
        .prefix("Context:")
        .description("List of (follow-up question, response) tuples.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> FieldContract {
        s.parse().unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_stopping_contract() {
        let base = base("question, unit -> answer: float");
        let stopping = ContractBuilder::new(&base)
            .stopping()
            .unwrap_or_else(|_| unreachable!());
        let inputs: Vec<&str> = stopping.input_names().collect();
        let outputs: Vec<&str> = stopping.output_names().collect();
        assert_eq!(inputs, ["question", "unit", "context"]);
        assert_eq!(outputs, ["ready"]);
        assert_eq!(
            stopping.field("ready").map(|f| f.ty),
            Some(FieldType::Bool)
        );
        assert_eq!(
            stopping.instructions(),
            "Given the fields `question`, `unit`, `context`, produce the fields `ready`."
        );
    }

    #[test]
    fn test_query_contract() {
        let base = base("question -> answer");
        let query = ContractBuilder::new(&base)
            .query()
            .unwrap_or_else(|_| unreachable!());
        let outputs: Vec<&str> = query.output_names().collect();
        assert_eq!(outputs, [FOLLOW_UP_QUESTION_FIELD]);
        assert_eq!(
            query.field(FOLLOW_UP_QUESTION_FIELD).map(|f| f.prefix.as_str()),
            Some("Follow-up Question:")
        );
    }

    #[test]
    fn test_answer_contract_keeps_base_outputs() {
        let base = base("question, unit -> answer: float, explanation");
        let answer = ContractBuilder::new(&base)
            .answer()
            .unwrap_or_else(|_| unreachable!());
        let inputs: Vec<&str> = answer.input_names().collect();
        let outputs: Vec<&str> = answer.output_names().collect();
        assert_eq!(inputs, ["question", "unit", "context"]);
        assert_eq!(outputs, ["answer", "explanation"]);
        assert_eq!(answer.field("answer").map(|f| f.ty), Some(FieldType::Float));
    }

    #[test]
    fn test_base_is_untouched() {
        let base = base("question -> answer");
        let before = base.clone();
        let _ = ContractBuilder::new(&base).build();
        assert_eq!(base, before);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let base = base("question, unit -> answer: float");
        let first = ContractBuilder::new(&base).build();
        let second = ContractBuilder::new(&base).build();
        assert!(first.is_ok());
        assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn test_context_collision_fails() {
        let base = base("question, context -> answer");
        let result = ContractBuilder::new(&base).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));

        let as_output = self::base("question -> context");
        let result = ContractBuilder::new(&as_output).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_reasoning_collision_fails() {
        let base = base("question -> reasoning");
        let result = ContractBuilder::new(&base).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));

        let as_input = self::base("question, reasoning -> answer");
        let result = ContractBuilder::new(&as_input).answer();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_ready_input_collision_fails() {
        let base = base("question, ready -> answer");
        let result = ContractBuilder::new(&base).stopping();
        assert!(matches!(result, Err(Error::Configuration { .. })));
        assert!(ContractBuilder::new(&base).answer().is_ok());
    }
}
