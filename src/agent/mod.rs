//! Agents: the reasoning primitive behind every step of the seeker loop.
//!
//! Provides the [`Agent`] trait, an LLM-backed [`Predictor`] implementation
//! over a pluggable provider abstraction, and the [`Oracle`] collaborators.
//!
//! # Architecture
//!
//! ```text
//! FieldContract ─► Predictor ─► prompt rendering ─► LlmProvider::chat
//!                      ▲                                   │
//!                      └──────── JSON record ◄─────────────┘
//!
//! Oracle ─► OracleAgent (one Predictor call) | FnOracle | HumanOracle
//! ```
//!
//! # Feature Gate
//!
//! The bundled `OpenAI`-compatible provider requires the `openai` feature
//! (enabled by default):
//! ```toml
//! [dependencies]
//! context-seeker = { version = "...", features = ["openai"] }
//! ```

pub mod client;
pub mod config;
pub mod message;
pub mod oracle;
pub mod predictor;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod traits;

// Re-export key types
pub use client::create_provider;
pub use config::{AgentConfig, DEFAULT_BUDGET};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use oracle::{FnOracle, HumanOracle, Oracle, OracleAgent, oracle_contract};
pub use predictor::Predictor;
pub use prompt::InstructionSet;
pub use provider::LlmProvider;
pub use traits::{Agent, AgentRole, Demo, invoke_checked};
