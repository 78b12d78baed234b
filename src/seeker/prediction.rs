//! Result of one seeker call.

use serde::Serialize;
use serde_json::Value;

use crate::context::ContextLog;
use crate::record::Record;

/// One transition taken by the seeker loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// The stopping agent ran and returned `ready`.
    Decided {
        /// The stopping agent's decision.
        ready: bool,
    },
    /// The query agent produced a follow-up question.
    Queried {
        /// The question.
        question: String,
    },
    /// The oracle answered a follow-up question.
    Consulted {
        /// The question asked.
        question: String,
        /// The oracle's answer.
        response: String,
    },
    /// The answer agent produced the final record.
    Answered,
}

/// Final answer record plus the context and transitions that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The answer agent's record; carries the base contract's output fields.
    pub outputs: Record,
    /// Every `(question, response)` pair gathered, in order.
    pub context: ContextLog,
    /// Loop transitions in the order they happened.
    pub steps: Vec<Step>,
}

impl Prediction {
    /// Value of an output field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Value of an output field if it is a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.outputs.get_str(name)
    }

    /// Number of oracle consultations made.
    #[must_use]
    pub const fn questions_asked(&self) -> usize {
        self.context.len()
    }
}
