//! Shared handle on one job server: transports, templates and identity

use std::sync::Arc;

use jobtree_common::{Credentials, EmbeddedTemplates, TemplateSource};

use crate::model::{encode_segment, FolderHandle};
use crate::transport::{FolderSubmitter, JobTransport};

/// Everything the resolver, lifecycle manager and build controller need to
/// talk to a job server. Cheap to clone.
#[derive(Clone)]
pub struct JobServer {
    pub(crate) transport: Arc<dyn JobTransport>,
    pub(crate) folders: Arc<dyn FolderSubmitter>,
    pub(crate) templates: Arc<dyn TemplateSource>,
    base_url: String,
    credentials: Option<Credentials>,
}

impl JobServer {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn JobTransport>,
        folders: Arc<dyn FolderSubmitter>,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            transport,
            folders,
            templates: Arc::new(EmbeddedTemplates),
            base_url,
            credentials: None,
        }
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateSource>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn transport(&self) -> &dyn JobTransport {
        self.transport.as_ref()
    }

    /// URL that new items under `parent` are created against
    pub(crate) fn scope_url(&self, parent: Option<&FolderHandle>) -> String {
        match parent {
            Some(folder) => folder.url().to_string(),
            None => self.base_url.clone(),
        }
    }

    /// Handle of the folder `name` directly under `parent`
    pub(crate) fn child_folder(&self, parent: Option<&FolderHandle>, name: &str) -> FolderHandle {
        FolderHandle::new(format!(
            "{}job/{}/",
            self.scope_url(parent),
            encode_segment(name)
        ))
    }
}

impl std::fmt::Debug for JobServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobServer")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
