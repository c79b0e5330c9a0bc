//! Domain model for the remote job hierarchy
//!
//! Handles are query results, never cached: the job server is the source of
//! truth and every operation re-reads it.

use serde::{Deserialize, Serialize};

use jobtree_common::{Error, Result};

/// Logical address of a folder, as a sequence of folder names.
///
/// The empty path stands for the top-level scope. Segments are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// The top-level scope
    pub fn top_level() -> Self {
        Self::default()
    }

    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Parse `"teamA/projectX"`. One leading and one trailing slash are tolerated.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::top_level());
        }
        Self::new(trimmed.split('/'))
            .map_err(|_| Error::InvalidPath(format!("'{path}' contains an empty segment")))
    }

    /// A new path with `segment` appended
    pub fn append(&self, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment, i.e. the top-level folder this path lives under
    pub fn root(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// `a/b/job`, or just `job` at the top level
    pub fn display_path(&self, job: &str) -> String {
        if self.is_top_level() {
            job.to_string()
        } else {
            format!("{}/{}", self, job)
        }
    }

    /// Relative URL of the folder on a Jenkins-style server: `job/a/job/b/`
    pub fn class_job_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("job/{}/", encode_segment(s)))
            .collect()
    }
}

impl std::fmt::Display for FolderPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for FolderPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FolderPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<FolderPath> for String {
    fn from(path: FolderPath) -> Self {
        path.to_string()
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::InvalidPath("folder names must not be empty".into()));
    }
    if segment.contains('/') {
        return Err(Error::InvalidPath(format!(
            "folder name '{segment}' must not contain '/'"
        )));
    }
    Ok(())
}

/// Encode a job or folder name for use in a URL path
pub fn encode_segment(name: &str) -> String {
    name.replace('%', "%25")
        .replace(' ', "%20")
        .replace('+', "%2B")
        .replace('#', "%23")
        .replace('?', "%3F")
}

/// Reference to a folder that exists on the job server.
///
/// Only this crate mints handles, by resolving or creating the folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderHandle {
    url: String,
}

impl FolderHandle {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self { url }
    }

    /// Canonical folder URL, always ending with `/`
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for FolderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// A job identified by name inside an optional folder (absent = top level)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobRef {
    pub folder: Option<FolderHandle>,
    pub name: String,
}

impl JobRef {
    pub fn new(folder: Option<FolderHandle>, name: impl Into<String>) -> Self {
        Self {
            folder,
            name: name.into(),
        }
    }
}

/// One execution of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildHandle {
    pub number: u32,
    pub url: String,
}

/// Terminal outcome of a build, in the server's wire spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildResult::Success => write!(f, "SUCCESS"),
            BuildResult::Unstable => write!(f, "UNSTABLE"),
            BuildResult::Failure => write!(f, "FAILURE"),
            BuildResult::NotBuilt => write!(f, "NOT_BUILT"),
            BuildResult::Aborted => write!(f, "ABORTED"),
            BuildResult::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl std::str::FromStr for BuildResult {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            "FAILURE" => Ok(BuildResult::Failure),
            "NOT_BUILT" => Ok(BuildResult::NotBuilt),
            "ABORTED" => Ok(BuildResult::Aborted),
            other => Err(Error::Config(format!("unknown build result '{other}'"))),
        }
    }
}

/// A job seen as a folder-like container (folders and multi-branch jobs)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderView {
    pub handle: FolderHandle,
    pub jobs: Vec<String>,
}
