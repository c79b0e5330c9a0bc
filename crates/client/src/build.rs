//! Build triggering, cascading abort and build-result conditions

use std::time::Duration;
use tracing::{debug, info};

use jobtree_common::{Error, Result};

use crate::model::{BuildResult, FolderPath, JobRef};
use crate::poller::ConditionPoller;
use crate::remote::JobServer;
use crate::resolver::PathResolver;

#[derive(Debug, Clone)]
pub struct BuildController {
    server: JobServer,
    resolver: PathResolver,
    poller: ConditionPoller,
}

impl BuildController {
    pub fn new(server: JobServer, resolver: PathResolver, poller: ConditionPoller) -> Self {
        Self {
            server,
            resolver,
            poller,
        }
    }

    /// Resolve `folder` (never creating it) and look up `name` inside it
    pub async fn find_job(&self, folder: &FolderPath, name: &str) -> Result<JobRef> {
        let handle = self.resolver.resolve(folder, false).await?;
        self.server
            .transport()
            .get_job(handle.as_ref(), name)
            .await?
            .ok_or_else(|| Error::not_found("job", folder.display_path(name)))
    }

    /// Trigger a build of `job` in `folder`
    pub async fn build(&self, folder: &FolderPath, job: &str) -> Result<()> {
        let job_ref = self.find_job(folder, job).await?;
        self.server.transport().trigger_build(&job_ref).await?;
        info!("Triggered build of {}", folder.display_path(job));
        Ok(())
    }

    /// Trigger the branch job `branch` of the multi-branch job `pipeline`
    pub async fn build_branch(&self, folder: &FolderPath, pipeline: &str, branch: &str) -> Result<()> {
        self.build(&folder.append(pipeline)?, branch).await
    }

    /// Stop every running build of `job` and, when `job` is a folder-like
    /// container, of every job beneath it. Returns the number of builds stopped.
    ///
    /// The traversal keeps its own work stack rather than recursing. It
    /// assumes the remote hierarchy is a finite tree; cycles are not detected.
    pub async fn abort_all_builds(&self, folder: &FolderPath, job: &str) -> Result<usize> {
        let transport = self.server.transport();
        let mut pending = vec![(folder.clone(), job.to_string())];
        let mut stopped = 0;

        while let Some((folder, name)) = pending.pop() {
            let job_ref = self.find_job(&folder, &name).await?;

            for build in transport.list_builds(&job_ref).await? {
                if transport.build_result(&build).await?.is_none() {
                    transport.stop_build(&build).await?;
                    stopped += 1;
                    info!("Stopped build {} - #{}", folder.display_path(&name), build.number);
                }
            }

            if let Some(view) = transport.folder_view(&job_ref).await? {
                let scope = folder.append(name.as_str())?;
                // reversed so children are visited in listing order
                for child in view.jobs.into_iter().rev() {
                    pending.push((scope.clone(), child));
                }
            }
        }

        Ok(stopped)
    }

    /// Result of the most recent build, `None` while it is running.
    /// A job without builds is `NotFound`.
    pub async fn last_build_result(&self, folder: &FolderPath, job: &str) -> Result<Option<BuildResult>> {
        let job_ref = self.find_job(folder, job).await?;
        let transport = self.server.transport();
        let latest = transport
            .list_builds(&job_ref)
            .await?
            .into_iter()
            .max_by_key(|b| b.number)
            .ok_or_else(|| Error::not_found("build", folder.display_path(job)))?;
        transport.build_result(&latest).await
    }

    /// A predicate that is true once the latest build of `job` finished
    /// with `desired`. Meant to be evaluated repeatedly by a poller.
    pub fn until_build_result(&self, folder: &FolderPath, job: &str, desired: BuildResult) -> BuildResultCondition {
        BuildResultCondition {
            builds: self.clone(),
            folder: folder.clone(),
            job: job.to_string(),
            desired,
        }
    }

    /// Poll until the latest build of `job` finished with `desired`
    pub async fn wait_for_build_result(
        &self,
        folder: &FolderPath,
        job: &str,
        desired: BuildResult,
        timeout: Duration,
    ) -> Result<()> {
        let condition = self.until_build_result(folder, job, desired);
        let description = format!("{} to finish with {}", folder.display_path(job), desired);
        let condition = &condition;
        self.poller
            .until_true(&description, timeout, move || condition.is_met())
            .await
    }
}

#[derive(Debug, Clone)]
pub struct BuildResultCondition {
    builds: BuildController,
    folder: FolderPath,
    job: String,
    desired: BuildResult,
}

impl BuildResultCondition {
    /// Re-resolve the job and compare its latest result. Errors, including
    /// "no builds yet", read as not met.
    pub async fn is_met(&self) -> bool {
        match self.builds.last_build_result(&self.folder, &self.job).await {
            Ok(result) => result == Some(self.desired),
            Err(e) => {
                debug!("{} not ready: {}", self.folder.display_path(&self.job), e);
                false
            }
        }
    }

    pub fn desired(&self) -> BuildResult {
        self.desired
    }
}
