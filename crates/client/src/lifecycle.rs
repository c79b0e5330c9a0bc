//! Idempotent create/delete of jobs and folders

use tracing::{debug, info};

use jobtree_common::template::primary_params;
use jobtree_common::{Error, Result, TemplateKind, TemplateParams};

use crate::model::{FolderHandle, FolderPath, JobRef};
use crate::remote::JobServer;
use crate::resolver::PathResolver;

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    server: JobServer,
    resolver: PathResolver,
}

impl LifecycleManager {
    pub fn new(server: JobServer, resolver: PathResolver) -> Self {
        Self { server, resolver }
    }

    /// Delete a job. A job that is already gone counts as deleted.
    pub async fn delete_job(&self, folder: Option<&FolderHandle>, name: &str) -> Result<()> {
        self.delete_item("job", folder, name).await
    }

    /// Delete a top-level folder by name. A folder that is already gone
    /// counts as deleted.
    ///
    /// Only top-level folders can be deleted: a parent handle is refused
    /// before any request is made.
    pub async fn delete_folder(&self, folder: Option<&FolderHandle>, name: &str) -> Result<()> {
        if let Some(parent) = folder {
            return Err(Error::Unsupported(format!(
                "deleting a nested folder is not supported ({}job/{})",
                parent, name
            )));
        }
        self.delete_item("folder", None, name).await
    }

    /// Delete the top-level folder named by a one-segment path.
    ///
    /// Nested folders are refused before any request is made.
    pub async fn delete_folder_path(&self, path: &FolderPath) -> Result<()> {
        match path.segments() {
            [] => Err(Error::Unsupported(
                "cannot delete the top-level scope".into(),
            )),
            [root] => self.delete_folder(None, root).await,
            _ => Err(Error::Unsupported(format!(
                "deleting a nested folder is not supported ({})",
                path
            ))),
        }
    }

    async fn delete_item(&self, kind: &str, folder: Option<&FolderHandle>, name: &str) -> Result<()> {
        match self.server.transport().delete_job(folder, name).await {
            Ok(()) => {
                info!("Deleted {} {}", kind, name);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("{} {} already absent", kind, name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace `name` with a fresh job rendered from the `kind` template.
    ///
    /// Any existing job of that name is deleted first. Multi-branch jobs get
    /// an immediate build so that their branches are discovered.
    pub async fn create_job(
        &self,
        kind: TemplateKind,
        folder: Option<&FolderHandle>,
        name: &str,
        params: &TemplateParams,
    ) -> Result<JobRef> {
        if kind == TemplateKind::Folder {
            return Err(Error::Unsupported(
                "folders are created with create_folder".into(),
            ));
        }

        self.delete_job(folder, name).await?;

        let definition = self.server.templates.render(kind, params)?;
        self.server
            .transport()
            .create_job(folder, name, &definition)
            .await?;
        info!("Created {} job {}", kind, name);

        let job = JobRef::new(folder.cloned(), name);
        if kind.triggers_initial_build() {
            self.server.transport().trigger_build(&job).await?;
            info!("Triggered initial build of {}", name);
        }
        Ok(job)
    }

    pub async fn create_pipeline(
        &self,
        folder: Option<&FolderHandle>,
        name: &str,
        script: &str,
    ) -> Result<JobRef> {
        let kind = TemplateKind::Pipeline;
        self.create_job(kind, folder, name, &primary_params(kind, script))
            .await
    }

    pub async fn create_freestyle(
        &self,
        folder: Option<&FolderHandle>,
        name: &str,
        command: &str,
    ) -> Result<JobRef> {
        let kind = TemplateKind::Freestyle;
        self.create_job(kind, folder, name, &primary_params(kind, command))
            .await
    }

    pub async fn create_multibranch(
        &self,
        folder: Option<&FolderHandle>,
        name: &str,
        repository: &str,
    ) -> Result<JobRef> {
        let kind = TemplateKind::Multibranch;
        self.create_job(kind, folder, name, &primary_params(kind, repository))
            .await
    }

    /// Submit a folder creation request. Does not check for an existing folder.
    pub async fn create_folder(
        &self,
        parent: Option<&FolderHandle>,
        name: &str,
    ) -> Result<FolderHandle> {
        self.resolver.create_folder(parent, name).await
    }

    /// Create every folder of `path`, each inside the previous one, and
    /// return the deepest. With `delete_existing_root` the top-level folder
    /// is removed first so the chain starts from a clean slate.
    pub async fn create_folder_chain(
        &self,
        path: &FolderPath,
        delete_existing_root: bool,
    ) -> Result<FolderHandle> {
        let (root, rest) = path
            .segments()
            .split_first()
            .ok_or_else(|| Error::InvalidPath("cannot create an empty folder chain".into()))?;

        if delete_existing_root {
            self.delete_folder(None, root).await?;
        }

        let mut last = self.create_folder(None, root).await?;
        for segment in rest {
            last = self.create_folder(Some(&last), segment).await?;
        }
        Ok(last)
    }
}
