//! Error types for the skyform system
//!
//! Every failure surfaced by the client, the poller or a resource is one of
//! these kinds. The poller only ever retries on "still pending"; everything
//! here is terminal for the caller except [`Error::NotFound`] while waiting
//! for a deletion.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for skyform operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the skyform system
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote API answered with a status outside the accepted set
    #[error("Remote API rejected request (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The remote resource does not exist (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource did not reach a target state before the deadline
    #[error(
        "Timeout after {timeout:?} waiting for state to become {target:?} (last state: {last_state:?})"
    )]
    Timeout {
        /// Last state label observed before giving up
        last_state: String,
        /// Target labels the caller was waiting for
        target: Vec<String>,
        /// Configured overall deadline
        timeout: Duration,
    },

    /// The resource reported a state outside the pending and target sets
    #[error("Unexpected state {state:?}, wanted one of {expected:?}")]
    UnexpectedState {
        /// The label that was reported
        state: String,
        /// Pending and target labels the poller knows about
        expected: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input, e.g. a required request field is missing
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A resource-level operation failed; the original kind is kept as source
    #[error("Error {action}: {source}")]
    Resource {
        /// What the resource was doing, e.g. "creating NAT gateway"
        action: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a remote rejection error
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Wrap an error with the resource action that produced it
    pub fn resource(action: impl Into<String>, source: Error) -> Self {
        Self::Resource {
            action: action.into(),
            source: Box::new(source),
        }
    }

    /// Classify an HTTP status that fell outside the accepted codes
    ///
    /// 404 becomes [`Error::NotFound`] so callers can match on it; every
    /// other status is a [`Error::Remote`] rejection.
    pub fn from_status(status: u16, url: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => Self::NotFound(format!("{url}: {body}")),
            _ => Self::Remote {
                status,
                message: body,
            },
        }
    }

    /// Whether this error (or the error it wraps) is a 404
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Resource { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether this error is a poller timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Resource { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Remote { status, .. } => Some(*status),
            Self::Resource { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
