//! Agent trait definition.
//!
//! Every participant in the seeker loop (stopping, query, answer, and the
//! oracle's underlying predictor) implements [`Agent`], so the loop can be
//! driven by LLM-backed predictors, scripted test doubles, or anything else
//! that maps a record to a record.

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::record::Record;
use crate::signature::FieldContract;

/// Role an agent plays in the seeker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Decides whether enough context has been gathered.
    Stopping,
    /// Produces the next follow-up question.
    Query,
    /// Produces the final answer.
    Answer,
    /// Answers follow-up questions from privileged context.
    Oracle,
}

impl AgentRole {
    /// All roles in loop order.
    pub const ALL: [Self; 4] = [Self::Stopping, Self::Query, Self::Answer, Self::Oracle];

    /// Short lowercase name used in logs and file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopping => "stopping",
            Self::Query => "query",
            Self::Answer => "answer",
            Self::Oracle => "oracle",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component that maps an input record to an output record under a
/// declared [`FieldContract`].
///
/// Implementations must be cheaply clonable into an independent instance
/// through [`Agent::boxed_clone`]; extracting a deployable seeker relies on
/// it.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &str;

    /// The contract this agent was constructed with.
    fn contract(&self) -> &FieldContract;

    /// Runs the agent once.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying primitive fails with; callers do not
    /// retry.
    async fn invoke(&self, inputs: &Record) -> Result<Record>;

    /// Returns an independent copy of this agent.
    fn boxed_clone(&self) -> Box<dyn Agent>;

    /// Replaces the instruction text. Agents without tunable instructions
    /// ignore this.
    fn set_instructions(&mut self, _instructions: String) {}

    /// Few-shot demonstrations currently attached.
    fn demos(&self) -> &[Demo] {
        &[]
    }

    /// Replaces the demonstrations. Agents that do not use demos ignore
    /// this.
    fn set_demos(&mut self, _demos: Vec<Demo>) {}
}

/// A few-shot demonstration: an input record and the outputs expected for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Demo {
    /// Demonstration inputs.
    pub inputs: Record,
    /// Demonstration outputs.
    pub outputs: Record,
}

impl Clone for Box<dyn Agent> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl fmt::Debug for dyn Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name())
            .field("contract", &self.contract().to_string())
            .finish()
    }
}

/// Invokes `agent` with contract checks on both sides.
///
/// Inputs are checked against the agent's input fields before the call;
/// outputs are coerced to their declared types after it.
///
/// # Errors
///
/// Returns [`crate::Error::ContractViolation`] on a bad record on either
/// side, or the agent's own error unchanged.
pub async fn invoke_checked(agent: &dyn Agent, inputs: &Record) -> Result<Record> {
    let contract = agent.contract();
    contract.check_inputs(agent.name(), inputs)?;

    debug!(agent = agent.name(), fields = inputs.len(), "invoking agent");
    let raw = agent.invoke(inputs).await?;

    let outputs = contract.conform_outputs(agent.name(), raw)?;
    debug!(agent = agent.name(), "agent returned conforming record");
    Ok(outputs)
}
