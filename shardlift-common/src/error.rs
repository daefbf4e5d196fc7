//! Error taxonomy shared by the adapters, gateways and workflows

use crate::ApiDialect;

/// Boxed cause carried by transport and cloud errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid parameter, raised before any network call
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Request never produced a response
    #[error("failed to execute {operation} request")]
    Transport {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// Cluster answered with a non-success status
    #[error("failed to execute {operation} request. code: {status}, body: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Cloud provider SDK call failed
    #[error("failed to call {operation}")]
    Cloud {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("invalid response body from {operation}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    /// Bounded poll ran out of attempts
    #[error("timed out after {attempts} attempts waiting for {condition}")]
    Timeout { condition: String, attempts: u32 },

    #[error("failed to detect cluster version: {0}")]
    Detection(String),

    #[error("cluster version {0:?} is not supported")]
    UnsupportedVersion(String),

    /// Capability the adapter for this dialect does not provide
    #[error("{capability} is not supported by cluster API {dialect}")]
    Unsupported {
        capability: &'static str,
        dialect: ApiDialect,
    },

    /// Names the workflow step that failed
    #[error("failed to {step}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn transport(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            operation,
            source: source.into(),
        }
    }

    pub fn cloud(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Cloud {
            operation,
            source: source.into(),
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Innermost error below any step wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when a bounded poll gave up, as opposed to a call failing
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Error::Timeout { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self.root(), Error::Config(_))
    }
}

/// Result type alias for shardlift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Attach the failing workflow step to an error
pub trait StepContext<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|source| Error::Step {
            step,
            source: Box::new(source),
        })
    }
}
