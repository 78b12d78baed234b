//! Training wrapper around a seeker.
//!
//! A trainer always carries an oracle and takes privileged context per
//! call, so the same seeker can be run over a dataset where every example
//! has its own privileged facts. The deployable seeker is obtained with
//! [`ContextSeekerTrainer::extract_context_seeker`].

use std::sync::Arc;

use tracing::debug;

use super::context_seeker::ContextSeeker;
use super::prediction::Prediction;
use crate::agent::oracle::PRIVILEGED_CONTEXT_FIELD;
use crate::agent::{Agent, AgentRole, Oracle};
use crate::error::{Error, Result};
use crate::record::Record;

/// Seeker plus oracle, with privileged context supplied per call.
#[derive(Debug)]
pub struct ContextSeekerTrainer {
    seeker: ContextSeeker,
    includes_allowed_questions: bool,
}

impl ContextSeekerTrainer {
    /// Wraps a seeker that has an oracle attached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the seeker has no oracle.
    pub fn new(seeker: ContextSeeker, includes_allowed_questions: bool) -> Result<Self> {
        if seeker.oracle().is_none() {
            return Err(Error::configuration(
                "a trainer needs an oracle; set one or supply an oracle agent factory",
            ));
        }
        if includes_allowed_questions {
            debug!("includes_allowed_questions is recorded but has no effect");
        }
        Ok(Self {
            seeker,
            includes_allowed_questions,
        })
    }

    /// Runs the wrapped seeker with `privileged_context` for this call only.
    ///
    /// # Errors
    ///
    /// Anything [`ContextSeeker::forward_with_privileged_context`] returns.
    pub async fn forward(&self, privileged_context: &str, inputs: &Record) -> Result<Prediction> {
        self.seeker
            .forward_with_privileged_context(inputs, privileged_context)
            .await
    }

    /// Runs one dataset example whose record carries its own
    /// `privileged_context` field alongside the base inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPrivilegedContext`] if the example has no
    /// string `privileged_context`, otherwise as
    /// [`ContextSeekerTrainer::forward`].
    pub async fn forward_example(&self, example: &Record) -> Result<Prediction> {
        let privileged_context = example
            .get_str(PRIVILEGED_CONTEXT_FIELD)
            .ok_or(Error::MissingPrivilegedContext)?;
        let mut inputs = example.clone();
        inputs.remove(PRIVILEGED_CONTEXT_FIELD);
        self.forward(privileged_context, &inputs).await
    }

    /// An independent seeker with copies of the current agents, no oracle,
    /// and no privileged context.
    #[must_use]
    pub fn extract_context_seeker(&self) -> ContextSeeker {
        self.seeker.freeze()
    }

    /// Replaces the oracle. `None` leaves the current one in place.
    pub fn update_oracle(&mut self, new_oracle: Option<Arc<dyn Oracle>>) {
        match new_oracle {
            Some(oracle) => self.seeker.set_oracle(oracle),
            None => debug!("update_oracle called without an oracle; keeping the current one"),
        }
    }

    /// The wrapped seeker.
    #[must_use]
    pub const fn context_seeker(&self) -> &ContextSeeker {
        &self.seeker
    }

    /// The tunable agents of the wrapped seeker.
    #[must_use]
    pub fn named_agents(&self) -> [(AgentRole, &dyn Agent); 3] {
        self.seeker.named_agents()
    }

    /// Mutable access to one tunable agent of the wrapped seeker.
    pub fn agent_mut(&mut self, role: AgentRole) -> Option<&mut Box<dyn Agent>> {
        self.seeker.agent_mut(role)
    }

    /// The flag given at construction.
    #[must_use]
    pub const fn includes_allowed_questions(&self) -> bool {
        self.includes_allowed_questions
    }
}
