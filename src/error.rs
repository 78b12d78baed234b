//! Error types for context-seeker.
//!
//! [`Error`] is the crate-wide error returned by every public operation.
//! Failures of the underlying reasoning primitive (LLM transport, response
//! parsing, human oracle I/O) are wrapped as [`AgentError`] and passed
//! through unchanged; the seeker loop never recovers locally.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for contract derivation, the seeker loop, and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction: a field-name collision, a negative budget,
    /// a malformed signature string, or a missing constructor argument.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what was misconfigured.
        message: String,
    },

    /// An agent was called with, or returned, a record that does not
    /// satisfy its field contract.
    #[error("contract violation in {agent} agent: {message}")]
    ContractViolation {
        /// Name of the agent whose contract was violated.
        agent: String,
        /// Which field was missing or ill-typed.
        message: String,
    },

    /// The oracle was about to be consulted but no privileged context
    /// was supplied for this call.
    #[error("privileged context is not set; call set_privileged_context or use a trainer")]
    MissingPrivilegedContext,

    /// The oracle was about to be consulted but the seeker has none attached
    /// (for example a seeker produced by `extract_context_seeker`).
    #[error("no oracle attached to this context seeker")]
    MissingOracle,

    /// Failure of the underlying reasoning primitive.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Filesystem failure (prompt directories, privileged context files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::ContractViolation`].
    pub fn contract(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            agent: agent.into(),
            message: message.into(),
        }
    }
}

/// Opaque failures of the reasoning primitive and its providers.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key found in configuration or environment.
    #[error("API key not configured. Set OPENAI_API_KEY or SEEKER_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name has no implementation.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The provider request failed (network, HTTP status, rate limit).
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error message.
        message: String,
        /// HTTP status code, when known.
        status: Option<u16>,
    },

    /// The model answered but the completion could not be parsed.
    #[error("failed to parse response: {message}")]
    ResponseParse {
        /// Parse failure description.
        message: String,
        /// Raw completion content.
        content: String,
    },

    /// An interactive oracle could not read or write its session.
    #[error("oracle session failed: {message}")]
    OracleIo {
        /// Description of the I/O failure.
        message: String,
    },
}

/// Failures specific to CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The command ran but failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = Error::configuration("field `context` already exists");
        assert_eq!(
            err.to_string(),
            "configuration error: field `context` already exists"
        );
    }

    #[test]
    fn test_contract_violation_display() {
        let err = Error::contract("stopping", "missing output field `ready`");
        assert!(err.to_string().contains("stopping agent"));
        assert!(err.to_string().contains("`ready`"));
    }

    #[test]
    fn test_agent_error_passes_through() {
        let err: Error = AgentError::ApiRequest {
            message: "timeout".to_string(),
            status: Some(504),
        }
        .into();
        assert_eq!(err.to_string(), "API request failed: timeout");
        assert!(matches!(err, Error::Agent(AgentError::ApiRequest { .. })));
    }
}
