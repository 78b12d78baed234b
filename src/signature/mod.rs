//! Field contracts (signatures) and their per-role derivation.
//!
//! A [`FieldContract`] declares which named, typed fields an agent consumes
//! and produces. The [`ContractBuilder`] turns one base task contract into
//! the stopping, query, and answer contracts used by the seeker loop.

pub mod contract;
pub mod derive;
pub mod field;

pub use contract::{FieldContract, default_instructions};
pub use derive::{
    CONTEXT_FIELD, ContractBuilder, ContractSet, FOLLOW_UP_QUESTION_FIELD, READY_FIELD,
    REASONING_FIELD, context_field,
};
pub use field::{Field, FieldRole, FieldType, infer_prefix};
