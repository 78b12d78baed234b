//! The clarification loop.
//!
//! A [`ContextSeeker`] wraps a base contract `I -> O`. Each call runs a
//! small state machine:
//!
//! ```text
//! Deciding ──ready or budget spent──► Answering ──► done
//!    │ not ready
//!    ▼
//! Querying ──► OracleConsult ──► Deciding
//! ```
//!
//! The stopping agent is consulted before every follow-up question, so a
//! seeker never asks a question it has already decided it does not need.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::builder::ContextSeekerBuilder;
use super::prediction::{Prediction, Step};
use crate::agent::{Agent, AgentRole, Oracle, invoke_checked};
use crate::context::ContextLog;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::signature::{CONTEXT_FIELD, FOLLOW_UP_QUESTION_FIELD, FieldContract, READY_FIELD};

/// Name used when the base contract rejects a call's inputs.
const SEEKER_NAME: &str = "context_seeker";

/// Asks clarifying questions of an oracle before answering.
///
/// Holds three agents derived from the base contract, an optional oracle,
/// the question budget, and an optional stored privileged context used by
/// [`ContextSeeker::forward`]. Per-call state lives in the call itself, so a
/// seeker can serve concurrent calls through a shared reference.
pub struct ContextSeeker {
    signature: FieldContract,
    stopping_agent: Box<dyn Agent>,
    query_agent: Box<dyn Agent>,
    answer_agent: Box<dyn Agent>,
    oracle: Option<Arc<dyn Oracle>>,
    budget: usize,
    privileged_context: Option<String>,
}

/// Next transition of the loop.
enum Phase {
    Deciding,
    Querying,
    OracleConsult { question: String },
    Answering,
}

/// State of a single `forward` call.
struct Episode<'a> {
    inputs: Record,
    privileged_context: Option<&'a str>,
    context: ContextLog,
    steps: Vec<Step>,
}

impl Episode<'_> {
    /// Base inputs plus the context gathered so far.
    fn agent_inputs(&self) -> Record {
        let mut record = self.inputs.clone();
        record.insert(CONTEXT_FIELD, self.context.to_value());
        record
    }

    const fn num_questions(&self) -> usize {
        self.context.len()
    }
}

impl ContextSeeker {
    /// Starts building a seeker over `signature`.
    #[must_use]
    pub fn builder(signature: FieldContract) -> ContextSeekerBuilder {
        ContextSeekerBuilder::new(signature)
    }

    pub(crate) fn from_parts(
        signature: FieldContract,
        stopping_agent: Box<dyn Agent>,
        query_agent: Box<dyn Agent>,
        answer_agent: Box<dyn Agent>,
        oracle: Option<Arc<dyn Oracle>>,
        budget: usize,
    ) -> Self {
        Self {
            signature,
            stopping_agent,
            query_agent,
            answer_agent,
            oracle,
            budget,
            privileged_context: None,
        }
    }

    /// The base contract `I -> O`.
    #[must_use]
    pub const fn signature(&self) -> &FieldContract {
        &self.signature
    }

    /// Maximum number of oracle consultations per call.
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// The stopping agent.
    #[must_use]
    pub fn stopping_agent(&self) -> &dyn Agent {
        self.stopping_agent.as_ref()
    }

    /// The query agent.
    #[must_use]
    pub fn query_agent(&self) -> &dyn Agent {
        self.query_agent.as_ref()
    }

    /// The answer agent.
    #[must_use]
    pub fn answer_agent(&self) -> &dyn Agent {
        self.answer_agent.as_ref()
    }

    /// Replaces the stopping agent.
    pub fn set_stopping_agent(&mut self, agent: Box<dyn Agent>) {
        self.stopping_agent = agent;
    }

    /// Replaces the query agent.
    pub fn set_query_agent(&mut self, agent: Box<dyn Agent>) {
        self.query_agent = agent;
    }

    /// Replaces the answer agent.
    pub fn set_answer_agent(&mut self, agent: Box<dyn Agent>) {
        self.answer_agent = agent;
    }

    /// The tunable agents in loop order.
    ///
    /// This is the full parameter surface exposed to optimizers; the oracle
    /// and the stored privileged context are not part of it.
    #[must_use]
    pub fn named_agents(&self) -> [(AgentRole, &dyn Agent); 3] {
        [
            (AgentRole::Stopping, self.stopping_agent.as_ref()),
            (AgentRole::Query, self.query_agent.as_ref()),
            (AgentRole::Answer, self.answer_agent.as_ref()),
        ]
    }

    /// Mutable access to one tunable agent. Returns `None` for
    /// [`AgentRole::Oracle`].
    pub fn agent_mut(&mut self, role: AgentRole) -> Option<&mut Box<dyn Agent>> {
        match role {
            AgentRole::Stopping => Some(&mut self.stopping_agent),
            AgentRole::Query => Some(&mut self.query_agent),
            AgentRole::Answer => Some(&mut self.answer_agent),
            AgentRole::Oracle => None,
        }
    }

    /// The attached oracle, if any.
    #[must_use]
    pub fn oracle(&self) -> Option<&Arc<dyn Oracle>> {
        self.oracle.as_ref()
    }

    /// Attaches (or replaces) the oracle.
    pub fn set_oracle(&mut self, oracle: Arc<dyn Oracle>) {
        self.oracle = Some(oracle);
    }

    /// Detaches the oracle.
    pub fn clear_oracle(&mut self) {
        self.oracle = None;
    }

    /// Stores privileged context for subsequent [`ContextSeeker::forward`]
    /// calls.
    pub fn set_privileged_context(&mut self, privileged_context: impl Into<String>) {
        self.privileged_context = Some(privileged_context.into());
    }

    /// Drops the stored privileged context.
    pub fn clear_privileged_context(&mut self) {
        self.privileged_context = None;
    }

    /// The stored privileged context, if any.
    #[must_use]
    pub fn privileged_context(&self) -> Option<&str> {
        self.privileged_context.as_deref()
    }

    /// Runs one clarification episode using the stored privileged context.
    ///
    /// # Errors
    ///
    /// - [`Error::ContractViolation`] if `inputs` lacks a base input field,
    ///   or an agent returns a non-conforming record
    /// - [`Error::MissingOracle`] / [`Error::MissingPrivilegedContext`] when
    ///   the loop reaches the oracle without one
    /// - any agent or oracle error, unchanged
    pub async fn forward(&self, inputs: &Record) -> Result<Prediction> {
        self.run(inputs, self.privileged_context.as_deref()).await
    }

    /// Runs one clarification episode with an explicit privileged context.
    ///
    /// The stored privileged context is ignored and left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`ContextSeeker::forward`], except that the privileged
    /// context can no longer be missing.
    pub async fn forward_with_privileged_context(
        &self,
        inputs: &Record,
        privileged_context: &str,
    ) -> Result<Prediction> {
        self.run(inputs, Some(privileged_context)).await
    }

    /// Returns an independent copy with cloned agents, no oracle, and no
    /// privileged context.
    #[must_use]
    pub fn freeze(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            stopping_agent: self.stopping_agent.boxed_clone(),
            query_agent: self.query_agent.boxed_clone(),
            answer_agent: self.answer_agent.boxed_clone(),
            oracle: None,
            budget: self.budget,
            privileged_context: None,
        }
    }

    async fn run(&self, inputs: &Record, privileged_context: Option<&str>) -> Result<Prediction> {
        self.signature.check_inputs(SEEKER_NAME, inputs)?;

        let mut episode = Episode {
            inputs: inputs.project(self.signature.input_names()),
            privileged_context,
            context: ContextLog::new(),
            steps: Vec::new(),
        };

        info!(budget = self.budget, "context seeker started");

        let mut phase = Phase::Deciding;
        loop {
            phase = match phase {
                Phase::Deciding => {
                    let ready = self.decide(&episode).await?;
                    episode.steps.push(Step::Decided { ready });
                    if ready {
                        Phase::Answering
                    } else if episode.num_questions() >= self.budget {
                        debug!(budget = self.budget, "question budget spent");
                        Phase::Answering
                    } else {
                        Phase::Querying
                    }
                }
                Phase::Querying => {
                    let question = self.next_question(&episode).await?;
                    episode.steps.push(Step::Queried {
                        question: question.clone(),
                    });
                    Phase::OracleConsult { question }
                }
                Phase::OracleConsult { question } => {
                    let response = self.consult(&episode, &question).await?;
                    episode.steps.push(Step::Consulted {
                        question: question.clone(),
                        response: response.clone(),
                    });
                    episode.context.push(question, response);
                    Phase::Deciding
                }
                Phase::Answering => {
                    let outputs = self.answer(&episode).await?;
                    episode.steps.push(Step::Answered);
                    info!(
                        questions_asked = episode.num_questions(),
                        "context seeker finished"
                    );
                    return Ok(Prediction {
                        outputs,
                        context: episode.context,
                        steps: episode.steps,
                    });
                }
            };
        }
    }

    async fn decide(&self, episode: &Episode<'_>) -> Result<bool> {
        let agent = self.stopping_agent.as_ref();
        let outputs = invoke_checked(agent, &episode.agent_inputs()).await?;
        let ready = outputs.get_bool(READY_FIELD).ok_or_else(|| {
            Error::contract(agent.name(), format!("`{READY_FIELD}` is not a boolean"))
        })?;
        debug!(ready, questions_asked = episode.num_questions(), "stopping decision");
        Ok(ready)
    }

    async fn next_question(&self, episode: &Episode<'_>) -> Result<String> {
        let agent = self.query_agent.as_ref();
        let outputs = invoke_checked(agent, &episode.agent_inputs()).await?;
        let question = outputs
            .get_str(FOLLOW_UP_QUESTION_FIELD)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::contract(
                    agent.name(),
                    format!("`{FOLLOW_UP_QUESTION_FIELD}` is not a string"),
                )
            })?;
        debug!(question = %question, "follow-up question");
        Ok(question)
    }

    async fn consult(&self, episode: &Episode<'_>, question: &str) -> Result<String> {
        let oracle = self.oracle.as_ref().ok_or(Error::MissingOracle)?;
        let privileged_context = episode
            .privileged_context
            .ok_or(Error::MissingPrivilegedContext)?;
        let response = oracle.consult(question, privileged_context).await?;
        debug!(response = %response, "oracle response");
        Ok(response)
    }

    async fn answer(&self, episode: &Episode<'_>) -> Result<Record> {
        let mut outputs = invoke_checked(self.answer_agent.as_ref(), &episode.agent_inputs()).await?;
        outputs.remove(CONTEXT_FIELD);
        Ok(outputs)
    }
}

impl fmt::Debug for ContextSeeker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSeeker")
            .field("signature", &self.signature.to_string())
            .field("stopping_agent", &self.stopping_agent)
            .field("query_agent", &self.query_agent)
            .field("answer_agent", &self.answer_agent)
            .field("has_oracle", &self.oracle.is_some())
            .field("budget", &self.budget)
            .field("has_privileged_context", &self.privileged_context.is_some())
            .finish()
    }
}
