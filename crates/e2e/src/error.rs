//! Error types for scenario runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Job server not ready after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Scenario parse error: {0}")]
    SpecParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Job API error: {0}")]
    Api(#[from] jobtree_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// True when the underlying failure was a polling timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, E2eError::Api(e) if e.is_timeout())
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
