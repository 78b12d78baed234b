//! The context-seeking loop and its training wrapper.
//!
//! # Architecture
//!
//! ```text
//! ContextSeekerBuilder ──► ContextSeeker ──(freeze)──► deployable seeker
//!          │                     ▲
//!          └──► ContextSeekerTrainer (oracle + per-call privileged context)
//! ```

pub mod builder;
pub mod context_seeker;
pub mod prediction;
pub mod trainer;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{AgentFactory, ContextSeekerBuilder};
pub use context_seeker::ContextSeeker;
pub use prediction::{Prediction, Step};
pub use trainer::ContextSeekerTrainer;
