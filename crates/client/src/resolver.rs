//! Folder path resolution with lazy creation

use tracing::{debug, info, warn};

use jobtree_common::{Error, Result, TemplateKind, TemplateParams};

use crate::model::{FolderHandle, FolderPath, JobRef};
use crate::remote::JobServer;

/// Turns a [`FolderPath`] into a handle on the remote folder it names.
#[derive(Debug, Clone)]
pub struct PathResolver {
    server: JobServer,
}

impl PathResolver {
    pub fn new(server: JobServer) -> Self {
        Self { server }
    }

    /// Walk `path` from the top level, one segment at a time.
    ///
    /// Returns `Ok(None)` for the top-level scope. With `create_missing`,
    /// absent segments are created in order; otherwise the first absent
    /// segment fails with `NotFound`.
    pub async fn resolve(
        &self,
        path: &FolderPath,
        create_missing: bool,
    ) -> Result<Option<FolderHandle>> {
        let mut current: Option<FolderHandle> = None;

        for (depth, segment) in path.segments().iter().enumerate() {
            let transport = self.server.transport();
            let job = match transport.get_job(current.as_ref(), segment).await? {
                Some(job) => job,
                None if create_missing => {
                    self.create_and_requery(current.as_ref(), segment).await?
                }
                None => {
                    return Err(Error::not_found("folder", partial_path(path, depth)));
                }
            };

            let view = transport.folder_view(&job).await?.ok_or_else(|| {
                Error::not_found("folder", format!("{} (not a folder)", partial_path(path, depth)))
            })?;
            current = Some(view.handle);
        }

        debug!("Resolved folder '{}'", path);
        Ok(current)
    }

    /// Submit a folder creation request under `parent` without checking
    /// whether the folder already exists.
    pub async fn create_folder(
        &self,
        parent: Option<&FolderHandle>,
        name: &str,
    ) -> Result<FolderHandle> {
        let target = self.server.scope_url(parent);
        let definition = self
            .server
            .templates
            .render(TemplateKind::Folder, &TemplateParams::new())?;

        self.server
            .folders
            .submit_folder_creation(&target, name, &definition, self.server.credentials())
            .await?;

        info!("Created folder: {}", name);
        Ok(self.server.child_folder(parent, name))
    }

    /// Create then re-read. Someone else creating the folder between our
    /// lookup and our request is fine as long as the re-read finds it.
    async fn create_and_requery(&self, parent: Option<&FolderHandle>, name: &str) -> Result<JobRef> {
        let attempt = self.create_folder(parent, name).await;

        match self.server.transport().get_job(parent, name).await? {
            Some(job) => {
                if let Err(e) = attempt {
                    warn!("Folder {} exists despite creation error: {}", name, e);
                }
                Ok(job)
            }
            None => Err(attempt
                .err()
                .unwrap_or_else(|| Error::not_found("folder", name))),
        }
    }
}

fn partial_path(path: &FolderPath, depth: usize) -> String {
    path.segments()[..=depth].join("/")
}
