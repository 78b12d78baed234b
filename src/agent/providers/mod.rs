//! Concrete [`LlmProvider`](super::provider::LlmProvider) implementations.

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;
