//! Server connection flags
//!
//! Settings are layered: config file (or defaults), then `JOBTREE_*`
//! environment variables, then explicit flags.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use jobtree_client::JobApi;
use jobtree_common::{Credentials, DirectoryTemplates, ServerConfig, TemplateSource};

#[derive(Args, Clone, Default)]
pub struct ConnectionArgs {
    /// Job server base URL
    #[arg(long, global = true, env = "JOBTREE_URL")]
    pub url: Option<String>,

    /// User name for basic auth
    #[arg(long, global = true, env = "JOBTREE_USER", requires = "token")]
    pub user: Option<String>,

    /// API token for basic auth
    #[arg(long, global = true, env = "JOBTREE_TOKEN", hide_env_values = true, requires = "user")]
    pub token: Option<String>,

    /// TOML file with server settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory with job definition templates overriding the built-in ones
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Polling interval in milliseconds
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,
}

impl ConnectionArgs {
    pub fn server_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ServerConfig::from_env()?,
        };

        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let (Some(user), Some(token)) = (&self.user, &self.token) {
            config.credentials = Some(Credentials::new(user.clone(), token.clone()));
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn connect(&self) -> Result<JobApi> {
        let config = self.server_config()?;
        debug!("Connecting to {}", config.base_url);

        let templates = match &self.templates {
            Some(dir) => {
                let source = DirectoryTemplates::new(dir)
                    .with_context(|| format!("Failed to open templates {}", dir.display()))?;
                Some(Arc::new(source) as Arc<dyn TemplateSource>)
            }
            None => None,
        };

        Ok(JobApi::connect_with_templates(&config, templates)?)
    }
}
