//! One entry point bundling the resolver, lifecycle manager, build
//! controller and poller over a single job server.

use std::sync::Arc;
use std::time::Duration;

use jobtree_common::{Result, ServerConfig, TemplateSource};

use crate::build::BuildController;
use crate::http::JenkinsHttp;
use crate::lifecycle::LifecycleManager;
use crate::model::{FolderHandle, FolderPath};
use crate::poller::ConditionPoller;
use crate::remote::JobServer;
use crate::resolver::PathResolver;

#[derive(Debug, Clone)]
pub struct JobApi {
    server: JobServer,
    resolver: PathResolver,
    lifecycle: LifecycleManager,
    builds: BuildController,
    poller: ConditionPoller,
    wait_timeout: Duration,
}

impl JobApi {
    pub fn new(server: JobServer, poller: ConditionPoller) -> Self {
        let resolver = PathResolver::new(server.clone());
        Self {
            lifecycle: LifecycleManager::new(server.clone(), resolver.clone()),
            builds: BuildController::new(server.clone(), resolver.clone(), poller),
            resolver,
            server,
            poller,
            wait_timeout: Duration::from_secs(60),
        }
    }

    /// Connect to a real server over HTTP
    pub fn connect(config: &ServerConfig) -> Result<Self> {
        Self::connect_with_templates(config, None)
    }

    pub fn connect_with_templates(
        config: &ServerConfig,
        templates: Option<Arc<dyn TemplateSource>>,
    ) -> Result<Self> {
        let http = Arc::new(JenkinsHttp::new(config)?);
        let base_url = http.base_url().to_string();
        let mut server = JobServer::new(base_url, http.clone(), http)
            .with_credentials(config.credentials.clone());
        if let Some(templates) = templates {
            server = server.with_templates(templates);
        }

        Ok(Self::new(server, ConditionPoller::new(config.poll_interval()))
            .with_wait_timeout(config.wait_timeout()))
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn server(&self) -> &JobServer {
        &self.server
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn builds(&self) -> &BuildController {
        &self.builds
    }

    pub fn poller(&self) -> &ConditionPoller {
        &self.poller
    }

    /// Default budget for build-result waits
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Shorthand for [`PathResolver::resolve`]
    pub async fn folder(&self, path: &FolderPath, create_missing: bool) -> Result<Option<FolderHandle>> {
        self.resolver.resolve(path, create_missing).await
    }
}
