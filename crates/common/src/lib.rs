//! jobtree Common Library
//!
//! Error taxonomy, server configuration and job definition templates shared
//! by the client, CLI and e2e crates.

pub mod config;
pub mod error;
pub mod template;

// Re-export commonly used types
pub use config::{Credentials, ServerConfig, DEFAULT_POLL_INTERVAL};
pub use error::{Error, Result};
pub use template::{
    DirectoryTemplates, EmbeddedTemplates, TemplateKind, TemplateParams, TemplateSource,
};

/// jobtree version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
