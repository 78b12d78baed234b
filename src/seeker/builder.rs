//! Construction of seekers and trainers.
//!
//! The builder derives the stopping, query, and answer contracts from the
//! base contract, applies any instruction overrides, and asks an
//! [`AgentFactory`] for one agent per role.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::context_seeker::ContextSeeker;
use super::trainer::ContextSeekerTrainer;
use crate::agent::config::validate_budget;
use crate::agent::{
    Agent, AgentConfig, AgentRole, DEFAULT_BUDGET, InstructionSet, LlmProvider, Oracle,
    OracleAgent, Predictor, oracle_contract,
};
use crate::error::{Error, Result};
use crate::signature::{ContractBuilder, FieldContract};

/// Makes the agent for a role from its derived contract.
pub type AgentFactory = Arc<dyn Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync>;

/// Builder for [`ContextSeeker`] and [`ContextSeekerTrainer`].
///
/// # Examples
///
/// ```no_run
/// use context_seeker::agent::{AgentConfig, create_provider};
/// use context_seeker::seeker::ContextSeeker;
///
/// # fn main() -> context_seeker::Result<()> {
/// let config = AgentConfig::from_env()?;
/// let provider = create_provider(&config)?;
/// let signature = "question -> answer: float".parse()?;
/// let trainer = ContextSeeker::builder(signature)
///     .predictors(provider, &config)
///     .build_trainer()?;
/// # let _ = trainer;
/// # Ok(())
/// # }
/// ```
pub struct ContextSeekerBuilder {
    signature: FieldContract,
    default_factory: Option<AgentFactory>,
    factories: HashMap<AgentRole, AgentFactory>,
    oracle: Option<Arc<dyn Oracle>>,
    budget: i64,
    instructions: InstructionSet,
    includes_allowed_questions: bool,
}

impl ContextSeekerBuilder {
    /// Creates a builder over the base contract.
    #[must_use]
    pub fn new(signature: FieldContract) -> Self {
        Self {
            signature,
            default_factory: None,
            factories: HashMap::new(),
            oracle: None,
            budget: i64::try_from(DEFAULT_BUDGET).unwrap_or(i64::MAX),
            instructions: InstructionSet::default(),
            includes_allowed_questions: false,
        }
    }

    /// Factory used for every role without a role-specific one.
    #[must_use]
    pub fn agents<F>(mut self, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    /// Uses LLM-backed [`Predictor`]s for every role and takes the budget
    /// from `config`.
    #[must_use]
    pub fn predictors(mut self, provider: Arc<dyn LlmProvider>, config: &AgentConfig) -> Self {
        let config = config.clone();
        self.budget = i64::try_from(config.budget).unwrap_or(i64::MAX);
        self.agents(move |role, contract| {
            Box::new(Predictor::new(role, contract, Arc::clone(&provider), &config))
        })
    }

    /// Factory for the stopping agent.
    #[must_use]
    pub fn stopping_agent<F>(self, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.role_factory(AgentRole::Stopping, factory)
    }

    /// Factory for the query agent.
    #[must_use]
    pub fn query_agent<F>(self, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.role_factory(AgentRole::Query, factory)
    }

    /// Factory for the answer agent.
    #[must_use]
    pub fn answer_agent<F>(self, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.role_factory(AgentRole::Answer, factory)
    }

    /// Factory for the agent behind the default [`OracleAgent`] of a
    /// trainer. Ignored once an explicit oracle is set.
    #[must_use]
    pub fn oracle_agent<F>(self, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.role_factory(AgentRole::Oracle, factory)
    }

    fn role_factory<F>(mut self, role: AgentRole, factory: F) -> Self
    where
        F: Fn(AgentRole, FieldContract) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        self.factories.insert(role, Arc::new(factory));
        self
    }

    /// Oracle to consult for follow-up answers.
    #[must_use]
    pub fn oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Maximum oracle consultations per call. Negative values are rejected
    /// at build time.
    #[must_use]
    pub const fn budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }

    /// Instruction overrides applied to the derived contracts.
    #[must_use]
    pub fn instructions(mut self, instructions: InstructionSet) -> Self {
        self.instructions = instructions;
        self
    }

    /// Recorded on the trainer; has no effect on behavior.
    #[must_use]
    pub const fn includes_allowed_questions(mut self, value: bool) -> Self {
        self.includes_allowed_questions = value;
        self
    }

    /// The derived contracts with instruction overrides applied, in loop
    /// order: stopping, query, answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the base contract collides with
    /// a reserved field name.
    pub fn contracts(&self) -> Result<[(AgentRole, FieldContract); 3]> {
        let set = ContractBuilder::new(&self.signature).build()?;
        Ok([
            (
                AgentRole::Stopping,
                self.instructions.apply(AgentRole::Stopping, set.stopping),
            ),
            (
                AgentRole::Query,
                self.instructions.apply(AgentRole::Query, set.query),
            ),
            (
                AgentRole::Answer,
                self.instructions.apply(AgentRole::Answer, set.answer),
            ),
        ])
    }

    fn make_agent(&self, role: AgentRole, contract: FieldContract) -> Result<Box<dyn Agent>> {
        let factory = self
            .factories
            .get(&role)
            .or(self.default_factory.as_ref())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "no {role} agent configured; supply a factory or call predictors()"
                ))
            })?;
        Ok(factory(role, contract))
    }

    /// Builds a seeker. The oracle stays unset unless one was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on a negative budget, a reserved
    /// field-name collision, or a role with no agent factory.
    pub fn build(self) -> Result<ContextSeeker> {
        let budget = validate_budget(self.budget)?;
        let [(_, stopping), (_, query), (_, answer)] = self.contracts()?;

        let stopping_agent = self.make_agent(AgentRole::Stopping, stopping)?;
        let query_agent = self.make_agent(AgentRole::Query, query)?;
        let answer_agent = self.make_agent(AgentRole::Answer, answer)?;

        debug!(
            signature = %self.signature,
            budget,
            has_oracle = self.oracle.is_some(),
            "built context seeker"
        );

        Ok(ContextSeeker::from_parts(
            self.signature,
            stopping_agent,
            query_agent,
            answer_agent,
            self.oracle,
            budget,
        ))
    }

    /// Builds a trainer. Without an explicit oracle, one is made from the
    /// oracle (or default) agent factory over the oracle contract.
    ///
    /// # Errors
    ///
    /// As [`ContextSeekerBuilder::build`], plus [`Error::Configuration`]
    /// when no oracle can be made.
    pub fn build_trainer(mut self) -> Result<ContextSeekerTrainer> {
        if self.oracle.is_none() {
            let contract = self
                .instructions
                .apply(AgentRole::Oracle, oracle_contract()?);
            let agent = self.make_agent(AgentRole::Oracle, contract)?;
            self.oracle = Some(Arc::new(OracleAgent::new(agent)));
        }
        let includes_allowed_questions = self.includes_allowed_questions;
        ContextSeekerTrainer::new(self.build()?, includes_allowed_questions)
    }
}

impl fmt::Debug for ContextSeekerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roles: Vec<&str> = self.factories.keys().map(|r| r.as_str()).collect();
        roles.sort_unstable();
        f.debug_struct("ContextSeekerBuilder")
            .field("signature", &self.signature.to_string())
            .field("has_default_factory", &self.default_factory.is_some())
            .field("role_factories", &roles)
            .field("has_oracle", &self.oracle.is_some())
            .field("budget", &self.budget)
            .field("includes_allowed_questions", &self.includes_allowed_questions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::seeker::testing::{CallLog, Script, ScriptedAgent, ScriptedOracle, scripted_builder};

    fn script() -> Script {
        Script {
            ready: vec![true],
            questions: vec!["unused"],
            answer: Record::new().with("answer", "42"),
        }
    }

    #[test]
    fn test_build_derives_contracts() {
        let log = CallLog::default();
        let seeker = scripted_builder("question -> answer", script(), &log)
            .build()
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            seeker.stopping_agent().contract().to_string(),
            "question, context: list[tuple[str, str]] -> ready: bool"
        );
        assert_eq!(
            seeker.query_agent().contract().to_string(),
            "question, context: list[tuple[str, str]] -> follow_up_question"
        );
        assert_eq!(
            seeker.answer_agent().contract().to_string(),
            "question, context: list[tuple[str, str]] -> answer"
        );
        assert_eq!(seeker.budget(), DEFAULT_BUDGET);
        assert!(seeker.oracle().is_none());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let log = CallLog::default();
        let result = scripted_builder("question -> answer", script(), &log)
            .budget(-1)
            .build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_reserved_field_rejected() {
        let log = CallLog::default();
        let result = scripted_builder("question, context -> answer", script(), &log).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_missing_factory_rejected() {
        let signature: FieldContract = "question -> answer".parse().unwrap_or_else(|_| unreachable!());
        let result = ContextSeekerBuilder::new(signature).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_instruction_overrides_applied() {
        let log = CallLog::default();
        let instructions = InstructionSet {
            stopping: Some("Stop early.".to_string()),
            ..InstructionSet::default()
        };
        let seeker = scripted_builder("question -> answer", script(), &log)
            .instructions(instructions)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(seeker.stopping_agent().contract().instructions(), "Stop early.");
        assert_ne!(seeker.query_agent().contract().instructions(), "Stop early.");
    }

    #[test]
    fn test_trainer_requires_oracle_source() {
        let log = CallLog::default();
        let result = scripted_builder("question -> answer", script(), &log).build_trainer();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_trainer_default_oracle_from_factory() {
        let log = CallLog::default();
        let oracle_log = log.clone();
        let trainer = scripted_builder("question -> answer", script(), &log)
            .oracle_agent(move |role, contract| {
                Box::new(ScriptedAgent::new(role, contract, Vec::new(), oracle_log.clone()))
            })
            .includes_allowed_questions(true)
            .build_trainer()
            .unwrap_or_else(|_| unreachable!());
        assert!(trainer.context_seeker().oracle().is_some());
        assert!(trainer.includes_allowed_questions());
    }

    #[test]
    fn test_trainer_with_explicit_oracle() {
        let log = CallLog::default();
        let trainer = scripted_builder("question -> answer", script(), &log)
            .oracle(Arc::new(ScriptedOracle::new(&["fact"])))
            .build_trainer();
        assert!(trainer.is_ok());
    }
}
