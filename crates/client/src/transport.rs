//! Seams to the job server
//!
//! `JobTransport` covers the job/build operations; `FolderSubmitter` covers
//! folder creation, which the server exposes as a plain `createItem` form
//! post rather than a first-class job operation.

use async_trait::async_trait;

use jobtree_common::{Credentials, Result};

use crate::model::{BuildHandle, BuildResult, FolderHandle, FolderView, JobRef};

#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Look up `name` under `parent` (or the top level). `Ok(None)` when absent.
    async fn get_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<Option<JobRef>>;

    /// The folder-like view of a job, or `None` for plain jobs.
    async fn folder_view(&self, job: &JobRef) -> Result<Option<FolderView>>;

    async fn create_job(
        &self,
        parent: Option<&FolderHandle>,
        name: &str,
        definition: &str,
    ) -> Result<()>;

    /// Returns `Error::NotFound` when the item does not exist.
    async fn delete_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<()>;

    async fn trigger_build(&self, job: &JobRef) -> Result<()>;

    async fn list_builds(&self, job: &JobRef) -> Result<Vec<BuildHandle>>;

    /// `None` while the build is still running.
    async fn build_result(&self, build: &BuildHandle) -> Result<Option<BuildResult>>;

    async fn stop_build(&self, build: &BuildHandle) -> Result<()>;
}

#[async_trait]
pub trait FolderSubmitter: Send + Sync {
    /// Submit a `createItem` request for folder `name` under `target_url`.
    async fn submit_folder_creation(
        &self,
        target_url: &str,
        name: &str,
        definition: &str,
        credentials: Option<&Credentials>,
    ) -> Result<()>;
}
