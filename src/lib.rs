//! # context-seeker
//!
//! Multi-agent question answering that gathers missing context before it
//! answers. Given a task contract such as `question -> answer: float`, a
//! [`ContextSeeker`] runs three agents derived from it:
//!
//! - a **stopping** agent decides whether enough context has been gathered,
//! - a **query** agent asks the next follow-up question,
//! - an **answer** agent produces the final record from the inputs plus the
//!   `(question, response)` pairs collected so far.
//!
//! Follow-up questions are answered by an [`Oracle`] that alone sees the
//! privileged context. A [`ContextSeekerTrainer`] supplies that context per
//! call and can extract an oracle-free seeker for deployment.
//!
//! ## Example
//!
//! ```no_run
//! use context_seeker::agent::{AgentConfig, create_provider};
//! use context_seeker::{ContextSeeker, Record};
//!
//! # async fn demo() -> context_seeker::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let provider = create_provider(&config)?;
//! let trainer = ContextSeeker::builder("question -> answer: float".parse()?)
//!     .predictors(provider, &config)
//!     .build_trainer()?;
//!
//! let prediction = trainer
//!     .forward(
//!         "F1: golf ball volume 40 cm^3\nF2: ocean volume 1.3e9 km^3",
//!         &Record::new().with("question", "How many golf balls fit in all the oceans?"),
//!     )
//!     .await?;
//! println!("{:?} after {} questions", prediction.get("answer"), prediction.questions_asked());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod context;
pub mod error;
pub mod record;
pub mod seeker;
pub mod signature;

pub use agent::{Agent, AgentConfig, AgentRole, FnOracle, HumanOracle, Oracle, OracleAgent};
pub use context::{ContextEntry, ContextLog};
pub use error::{AgentError, CommandError, Error, Result};
pub use record::Record;
pub use seeker::{ContextSeeker, ContextSeekerBuilder, ContextSeekerTrainer, Prediction, Step};
pub use signature::{ContractBuilder, ContractSet, Field, FieldContract, FieldRole, FieldType};
