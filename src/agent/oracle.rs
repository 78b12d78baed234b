//! Oracle collaborators.
//!
//! An oracle answers follow-up questions from privileged context the
//! seeker itself never sees. Anything implementing [`Oracle`] can be
//! plugged into a seeker: the agent-backed [`OracleAgent`], a plain closure
//! via [`FnOracle`], or a person at a terminal via [`HumanOracle`].

use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use super::traits::{Agent, invoke_checked};
use crate::error::{AgentError, Error, Result};
use crate::record::Record;
use crate::signature::{Field, FieldContract, FieldType};

/// Oracle input: the follow-up question.
pub const ORACLE_QUESTION_FIELD: &str = "question";
/// Oracle input: the privileged context.
pub const PRIVILEGED_CONTEXT_FIELD: &str = "privileged_context";
/// Oracle output: the answer.
pub const ORACLE_ANSWER_FIELD: &str = "answer";

/// Anything that can answer `(question, privileged_context) -> answer`.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answers one follow-up question.
    ///
    /// # Errors
    ///
    /// Implementations propagate their own failures unchanged.
    async fn consult(&self, question: &str, privileged_context: &str) -> Result<String>;
}

/// The oracle's field contract:
/// `question, privileged_context -> answer`.
///
/// # Errors
///
/// Never fails in practice; the field names are fixed and distinct.
pub fn oracle_contract() -> Result<FieldContract> {
    let fields = vec![
        Field::input(ORACLE_QUESTION_FIELD, FieldType::Str)
            .prefix("Follow-up question:")
            .description("The question to answer"),
        Field::input(PRIVILEGED_CONTEXT_FIELD, FieldType::Str)
            .prefix("Privileged context:")
            .description("Context that the oracle can use"),
        Field::output(ORACLE_ANSWER_FIELD, FieldType::Str)
            .prefix("Answer:")
            .description("The answer to the question"),
    ];
    FieldContract::new(fields)
}

/// Oracle backed by a single agent call.
///
/// Each consultation invokes the wrapped agent exactly once; errors from
/// the agent are returned as-is.
pub struct OracleAgent {
    agent: Box<dyn Agent>,
}

impl OracleAgent {
    /// Wraps an agent whose contract is [`oracle_contract`].
    #[must_use]
    pub fn new(agent: Box<dyn Agent>) -> Self {
        Self { agent }
    }

    /// The wrapped agent.
    #[must_use]
    pub fn agent(&self) -> &dyn Agent {
        self.agent.as_ref()
    }
}

impl fmt::Debug for OracleAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleAgent")
            .field("agent", &self.agent)
            .finish()
    }
}

#[async_trait]
impl Oracle for OracleAgent {
    async fn consult(&self, question: &str, privileged_context: &str) -> Result<String> {
        let inputs = Record::new()
            .with(ORACLE_QUESTION_FIELD, question)
            .with(PRIVILEGED_CONTEXT_FIELD, privileged_context);
        let outputs = invoke_checked(self.agent.as_ref(), &inputs).await?;
        outputs
            .get_str(ORACLE_ANSWER_FIELD)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::contract(
                    self.agent.name(),
                    format!("missing output field `{ORACLE_ANSWER_FIELD}`"),
                )
            })
    }
}

/// Adapts a synchronous closure into an [`Oracle`].
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    /// Wraps `f(question, privileged_context)`.
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Oracle for FnOracle<F>
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    async fn consult(&self, question: &str, privileged_context: &str) -> Result<String> {
        (self.f)(question, privileged_context)
    }
}

struct Session<R, W> {
    reader: R,
    writer: W,
}

/// Oracle that relays each question to a person and reads back one line.
///
/// Useful for debugging a seeker by hand. The question (and optionally the
/// privileged context) is written to `writer`; the answer is the next line
/// read from `reader`.
pub struct HumanOracle<R, W> {
    session: Mutex<Session<R, W>>,
    show_privileged_context: bool,
}

impl HumanOracle<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    /// Reads answers from stdin and writes prompts to stderr.
    #[must_use]
    pub fn stdio(show_privileged_context: bool) -> Self {
        Self::new(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stderr(),
            show_privileged_context,
        )
    }
}

impl<R, W> HumanOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates an oracle over an arbitrary reader/writer pair.
    pub fn new(reader: R, writer: W, show_privileged_context: bool) -> Self {
        Self {
            session: Mutex::new(Session { reader, writer }),
            show_privileged_context,
        }
    }

    /// Returns the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        let session = self.session.into_inner();
        (session.reader, session.writer)
    }
}

fn io_error(e: &std::io::Error) -> Error {
    AgentError::OracleIo {
        message: e.to_string(),
    }
    .into()
}

#[async_trait]
impl<R, W> Oracle for HumanOracle<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn consult(&self, question: &str, privileged_context: &str) -> Result<String> {
        let mut session = self.session.lock().await;

        let mut prompt = format!("Follow-up: {question}\n");
        if self.show_privileged_context && !privileged_context.is_empty() {
            prompt.push_str(&format!("Privileged context: {privileged_context}\n"));
        }
        prompt.push_str("Your answer: ");
        session
            .writer
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| io_error(&e))?;
        session.writer.flush().await.map_err(|e| io_error(&e))?;

        let mut line = String::new();
        let read = session
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| io_error(&e))?;
        if read == 0 {
            return Err(AgentError::OracleIo {
                message: "input closed before an answer was given".to_string(),
            }
            .into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
