//! Job server connection settings
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and `JOBTREE_*` environment variables. The CLI
//! adds a fourth layer through clap flags.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const ENV_URL: &str = "JOBTREE_URL";
pub const ENV_USER: &str = "JOBTREE_USER";
pub const ENV_TOKEN: &str = "JOBTREE_TOKEN";
pub const ENV_POLL_INTERVAL_MS: &str = "JOBTREE_POLL_INTERVAL_MS";
pub const ENV_TIMEOUT_MS: &str = "JOBTREE_TIMEOUT_MS";

/// Reference polling interval for condition waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Basic-auth credentials for the job server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Connection and polling configuration for a job server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root URL of the job server (e.g. `http://127.0.0.1:8080/jenkins/`)
    pub base_url: String,

    /// Credentials used for every request, if the server requires auth
    pub credentials: Option<Credentials>,

    /// Fixed interval between condition polls
    pub poll_interval_ms: u64,

    /// Default budget for build-result waits
    pub wait_timeout_ms: u64,

    /// Per-request HTTP timeout
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/".to_string(),
            credentials: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            wait_timeout_ms: 60_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file, then apply environment overrides
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        Self::load_toml(path)?.with_env_overrides()
    }

    fn load_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `JOBTREE_*` variables on top of this configuration
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_URL) {
            self.base_url = url;
        }

        match (lookup(ENV_USER), lookup(ENV_TOKEN)) {
            (Some(username), Some(api_token)) => {
                self.credentials = Some(Credentials::new(username, api_token));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(format!(
                    "{} and {} must be set together",
                    ENV_USER, ENV_TOKEN
                )));
            }
            (None, None) => {}
        }

        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.wait_timeout_ms = parse_millis(ENV_TIMEOUT_MS, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Base URL guaranteed to end with a slash, so relative paths can be appended
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number of milliseconds, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.wait_timeout(), Duration::from_secs(60));
        assert!(config.credentials.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::default()
            .with_overrides(lookup(&[
                (ENV_URL, "https://ci.example.com/jenkins"),
                (ENV_USER, "admin"),
                (ENV_TOKEN, "s3cret"),
                (ENV_POLL_INTERVAL_MS, "250"),
            ]))
            .unwrap();

        assert_eq!(config.normalized_base_url(), "https://ci.example.com/jenkins/");
        assert_eq!(config.credentials, Some(Credentials::new("admin", "s3cret")));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let err = ServerConfig::default()
            .with_overrides(lookup(&[(ENV_USER, "admin")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_interval_rejected() {
        let err = ServerConfig::default()
            .with_overrides(lookup(&[(ENV_POLL_INTERVAL_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url = "http://jenkins.local:8080"
wait_timeout_ms = 120000

[credentials]
username = "ci"
api_token = "abc123"
"#
        )
        .unwrap();

        let config = ServerConfig::load_toml(file.path()).unwrap();
        assert_eq!(config.base_url, "http://jenkins.local:8080");
        assert_eq!(config.wait_timeout(), Duration::from_secs(120));
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.credentials.unwrap().username, "ci");
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new("admin", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
    }
}
