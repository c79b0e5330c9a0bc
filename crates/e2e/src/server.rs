//! Job server readiness checks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{info, warn};

use jobtree_client::ConditionPoller;
use jobtree_common::ServerConfig;

use crate::error::{E2eError, E2eResult};

/// Polls a job server's root page until it answers
pub struct JenkinsProbe {
    client: reqwest::Client,
    url: String,
    poller: ConditionPoller,
}

impl JenkinsProbe {
    pub fn new(config: &ServerConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            client,
            url: config.normalized_base_url(),
            poller: ConditionPoller::new(config.poll_interval()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait until the server stops answering with 5xx or refusing connections.
    /// Returns the number of attempts it took.
    pub async fn wait_until_ready(&self, timeout: Duration) -> E2eResult<usize> {
        let attempts = AtomicUsize::new(0);
        let condition = format!("job server at {}", self.url);

        let ready = self
            .poller
            .until_true(&condition, timeout, || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let request = self.client.get(&self.url).send();
                async move {
                    match request.await {
                        Ok(resp) => {
                            let ready = is_ready(resp.status());
                            if !ready {
                                warn!("Readiness check returned {}", resp.status());
                            }
                            ready
                        }
                        Err(e) => {
                            if attempt == 1 {
                                info!("Waiting for job server to start...");
                            }
                            // Connection refused is expected while the server is starting
                            if !e.is_connect() {
                                warn!("Readiness check error: {}", e);
                            }
                            false
                        }
                    }
                }
            })
            .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match ready {
            Ok(()) => {
                info!("Job server is ready at {}", self.url);
                Ok(attempts)
            }
            Err(e) if e.is_timeout() => Err(E2eError::ServerHealthCheck(attempts)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Anything short of a server error means the server is up; an auth
/// challenge still counts.
fn is_ready(status: StatusCode) -> bool {
    status.is_success()
        || status.is_redirection()
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ready() {
        assert!(is_ready(StatusCode::OK));
        assert!(is_ready(StatusCode::FORBIDDEN));
        assert!(is_ready(StatusCode::FOUND));
        assert!(!is_ready(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_ready(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_unreachable_server_times_out() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let config = ServerConfig {
            base_url: "http://127.0.0.1:9/".into(),
            poll_interval_ms: 50,
            ..Default::default()
        };
        let probe = JenkinsProbe::new(&config).unwrap();

        let err = probe
            .wait_until_ready(Duration::from_millis(200))
            .await
            .unwrap_err();
        match err {
            E2eError::ServerHealthCheck(attempts) => assert!(attempts >= 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
