//! Jenkins REST transport over reqwest

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use jobtree_common::{Credentials, Error, Result, ServerConfig};

use crate::model::{encode_segment, BuildHandle, BuildResult, FolderHandle, FolderView, JobRef};
use crate::transport::{FolderSubmitter, JobTransport};

const XML_CONTENT_TYPE: &str = "application/xml";

/// Talks to a Jenkins-compatible server's JSON API and form endpoints
#[derive(Debug, Clone)]
pub struct JenkinsHttp {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

#[derive(Debug, Deserialize)]
struct JobJson {
    #[serde(default)]
    jobs: Option<Vec<ChildJson>>,
    #[serde(default)]
    builds: Vec<BuildJson>,
}

#[derive(Debug, Deserialize)]
struct ChildJson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BuildJson {
    number: u32,
    url: String,
}

#[derive(Debug, Deserialize)]
struct BuildDetailsJson {
    result: Option<BuildResult>,
    #[serde(default)]
    building: bool,
}

impl JenkinsHttp {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn scope_url(&self, parent: Option<&FolderHandle>) -> String {
        match parent {
            Some(folder) => folder.url().to_string(),
            None => self.base_url.clone(),
        }
    }

    fn item_url(&self, parent: Option<&FolderHandle>, name: &str) -> String {
        format!("{}job/{}/", self.scope_url(parent), encode_segment(name))
    }

    fn job_url(&self, job: &JobRef) -> String {
        self.item_url(job.folder.as_ref(), &job.name)
    }

    fn authed(&self, request: RequestBuilder, credentials: Option<&Credentials>) -> RequestBuilder {
        match credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.api_token)),
            None => request,
        }
    }

    /// GET a JSON document; `Ok(None)` on 404
    async fn get_json<T: DeserializeOwned>(&self, url: &str, kind: &str, name: &str) -> Result<Option<T>> {
        debug!("GET {}", url);
        let request = self.authed(self.client.get(url), self.credentials.as_ref());
        let response = request.send().await.map_err(transport_error)?;

        match check(response, kind, name).await {
            Ok(response) => Ok(Some(response.json().await.map_err(transport_error)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn post(
        &self,
        request: RequestBuilder,
        credentials: Option<&Credentials>,
        kind: &str,
        name: &str,
    ) -> Result<()> {
        let response = self
            .authed(request, credentials)
            .send()
            .await
            .map_err(transport_error)?;
        check(response, kind, name).await?;
        Ok(())
    }
}

/// 404 becomes `NotFound`; any other non-success status becomes `Transport`
async fn check(response: Response, kind: &str, name: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(Error::not_found(kind, name));
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(Error::transport(
        Some(status.as_u16()),
        format!("{} {}: {}", kind, name, snippet.trim()),
    ))
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::transport(e.status().map(|s| s.as_u16()), e.to_string())
}

#[async_trait]
impl JobTransport for JenkinsHttp {
    async fn get_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<Option<JobRef>> {
        let url = format!("{}api/json?tree=name", self.item_url(parent, name));
        let found: Option<serde_json::Value> = self.get_json(&url, "job", name).await?;
        Ok(found.map(|_| JobRef::new(parent.cloned(), name)))
    }

    async fn folder_view(&self, job: &JobRef) -> Result<Option<FolderView>> {
        let job_url = self.job_url(job);
        let url = format!("{}api/json?tree=jobs[name]", job_url);
        let details: JobJson = self
            .get_json(&url, "job", &job.name)
            .await?
            .ok_or_else(|| Error::not_found("job", job.name.as_str()))?;

        Ok(details.jobs.map(|jobs| FolderView {
            handle: FolderHandle::new(job_url),
            jobs: jobs.into_iter().map(|j| j.name).collect(),
        }))
    }

    async fn create_job(&self, parent: Option<&FolderHandle>, name: &str, definition: &str) -> Result<()> {
        let url = format!("{}createItem", self.scope_url(parent));
        let request = self
            .client
            .post(&url)
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(definition.to_string());
        self.post(request, self.credentials.as_ref(), "job", name).await
    }

    async fn delete_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<()> {
        let url = format!("{}doDelete", self.item_url(parent, name));
        self.post(self.client.post(&url), self.credentials.as_ref(), "job", name)
            .await
    }

    async fn trigger_build(&self, job: &JobRef) -> Result<()> {
        let url = format!("{}build", self.job_url(job));
        self.post(self.client.post(&url), self.credentials.as_ref(), "job", &job.name)
            .await
    }

    async fn list_builds(&self, job: &JobRef) -> Result<Vec<BuildHandle>> {
        let url = format!("{}api/json?tree=builds[number,url]", self.job_url(job));
        let details: JobJson = self
            .get_json(&url, "job", &job.name)
            .await?
            .ok_or_else(|| Error::not_found("job", job.name.as_str()))?;

        Ok(details
            .builds
            .into_iter()
            .map(|b| BuildHandle {
                number: b.number,
                url: b.url,
            })
            .collect())
    }

    async fn build_result(&self, build: &BuildHandle) -> Result<Option<BuildResult>> {
        let url = format!("{}api/json?tree=result,building", with_slash(&build.url));
        let name = format!("#{}", build.number);
        let details: BuildDetailsJson = self
            .get_json(&url, "build", &name)
            .await?
            .ok_or_else(|| Error::not_found("build", name.as_str()))?;

        if details.building {
            return Ok(None);
        }
        Ok(details.result)
    }

    async fn stop_build(&self, build: &BuildHandle) -> Result<()> {
        let url = format!("{}stop", with_slash(&build.url));
        let name = format!("#{}", build.number);
        self.post(self.client.post(&url), self.credentials.as_ref(), "build", &name)
            .await
    }
}

#[async_trait]
impl FolderSubmitter for JenkinsHttp {
    async fn submit_folder_creation(
        &self,
        target_url: &str,
        name: &str,
        definition: &str,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let url = format!("{}createItem", with_slash(target_url));
        let request = self
            .client
            .post(&url)
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(definition.to_string());
        self.post(request, credentials, "folder", name).await
    }
}

fn with_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
