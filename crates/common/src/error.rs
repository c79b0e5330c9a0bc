//! Error types for jobtree

use std::time::Duration;
use thiserror::Error;

/// Result type alias using jobtree Error
pub type Result<T> = std::result::Result<T, Error>;

/// jobtree error types
#[derive(Error, Debug)]
pub enum Error {
    /// The remote resource does not exist (HTTP 404 or an absent lookup).
    #[error("Resource not found: {kind} {name}")]
    NotFound { kind: String, name: String },

    /// The caller asked for something the job API deliberately refuses to do.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Any other failure talking to the job server.
    #[error("Transport error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Polling gave up before the condition became true.
    #[error("Timed out after {}ms waiting for {condition}", waited.as_millis())]
    Timeout { condition: String, waited: Duration },

    #[error("Invalid folder path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            status,
            message: message.into(),
        }
    }

    /// True for the "already gone / not there yet" class of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_includes_status() {
        let err = Error::transport(Some(500), "boom");
        assert_eq!(err.to_string(), "Transport error (HTTP 500): boom");

        let err = Error::transport(None, "connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_classification() {
        assert!(Error::not_found("job", "build").is_not_found());
        assert!(!Error::Unsupported("nested".into()).is_not_found());

        let timeout = Error::Timeout {
            condition: "build result".into(),
            waited: Duration::from_millis(1500),
        };
        assert!(timeout.is_timeout());
        assert_eq!(
            timeout.to_string(),
            "Timed out after 1500ms waiting for build result"
        );
    }
}
