//! Scripted agents and oracles for seeker tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::builder::ContextSeekerBuilder;
use crate::agent::{Agent, AgentRole, Oracle};
use crate::error::{AgentError, Result};
use crate::record::Record;
use crate::signature::FieldContract;

/// Everything the scripted agents saw, shared across clones.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, Record)>>>,
}

impl CallLog {
    fn push(&self, agent: &str, inputs: &Record) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((agent.to_string(), inputs.clone()));
        }
    }

    /// Agent names in call order.
    pub fn names(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Inputs of every call made to `agent`.
    pub fn inputs_of(&self, agent: &str) -> Vec<Record> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(name, _)| name == agent)
                    .map(|(_, record)| record.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Agent that replays a fixed list of replies; the last reply repeats.
#[derive(Clone)]
pub struct ScriptedAgent {
    name: String,
    contract: FieldContract,
    replies: Arc<Vec<Record>>,
    cursor: Arc<AtomicUsize>,
    log: CallLog,
    fail: bool,
}

impl ScriptedAgent {
    pub fn new(role: AgentRole, contract: FieldContract, replies: Vec<Record>, log: CallLog) -> Self {
        Self {
            name: role.as_str().to_string(),
            contract,
            replies: Arc::new(replies),
            cursor: Arc::new(AtomicUsize::new(0)),
            log,
            fail: false,
        }
    }

    pub fn failing(role: AgentRole, contract: FieldContract, log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(role, contract, Vec::new(), log)
        }
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &FieldContract {
        &self.contract
    }

    async fn invoke(&self, inputs: &Record) -> Result<Record> {
        self.log.push(&self.name, inputs);
        if self.fail {
            return Err(AgentError::ApiRequest {
                message: format!("{} agent unavailable", self.name),
                status: Some(503),
            }
            .into());
        }
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .replies
            .get(i)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or_default())
    }

    fn boxed_clone(&self) -> Box<dyn Agent> {
        Box::new(Self {
            cursor: Arc::new(AtomicUsize::new(self.cursor.load(Ordering::SeqCst))),
            ..self.clone()
        })
    }
}

/// Oracle that answers from a fixed list and records what it was asked.
#[derive(Default)]
pub struct ScriptedOracle {
    answers: Vec<String>,
    asked: Mutex<Vec<(String, String)>>,
}

impl ScriptedOracle {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(ToString::to_string).collect(),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// `(question, privileged_context)` pairs in order.
    pub fn asked(&self) -> Vec<(String, String)> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn consult(&self, question: &str, privileged_context: &str) -> Result<String> {
        let mut asked = self
            .asked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let answer = self
            .answers
            .get(asked.len())
            .or_else(|| self.answers.last())
            .cloned()
            .unwrap_or_default();
        asked.push((question.to_string(), privileged_context.to_string()));
        Ok(answer)
    }
}

/// Replies for the three seeker agents.
pub struct Script {
    pub ready: Vec<bool>,
    pub questions: Vec<&'static str>,
    pub answer: Record,
}

/// A builder whose agents follow `script` and log into `log`.
pub fn scripted_builder(signature: &str, script: Script, log: &CallLog) -> ContextSeekerBuilder {
    let signature: FieldContract = signature.parse().unwrap_or_else(|_| unreachable!());
    let ready: Vec<Record> = script
        .ready
        .iter()
        .map(|r| Record::new().with("reasoning", "checking").with("ready", *r))
        .collect();
    let questions: Vec<Record> = script
        .questions
        .iter()
        .map(|q| Record::new().with("follow_up_question", *q))
        .collect();
    let answer = vec![script.answer];

    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    ContextSeekerBuilder::new(signature)
        .stopping_agent(move |role, contract| {
            Box::new(ScriptedAgent::new(role, contract, ready.clone(), l1.clone()))
        })
        .query_agent(move |role, contract| {
            Box::new(ScriptedAgent::new(role, contract, questions.clone(), l2.clone()))
        })
        .answer_agent(move |role, contract| {
            Box::new(ScriptedAgent::new(role, contract, answer.clone(), l3.clone()))
        })
}
