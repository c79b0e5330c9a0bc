//! In-memory job server (testing only)
//!
//! `MemoryJobServer` implements both [`JobTransport`] and
//! [`FolderSubmitter`] over a tree kept in memory. Every transport call is
//! recorded so tests can assert exactly which remote requests were issued.
//! Items are addressed in helpers by slash paths such as `teamA/projectX/build`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use jobtree_common::{Credentials, Error, Result};

use crate::model::{encode_segment, BuildHandle, BuildResult, FolderHandle, FolderView, JobRef};
use crate::remote::JobServer;
use crate::transport::{FolderSubmitter, JobTransport};

pub const FAKE_BASE_URL: &str = "http://jobtree.invalid/";

/// A request the fake received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetJob(String),
    FolderView(String),
    CreateFolder(String),
    CreateJob(String),
    DeleteJob(String),
    TriggerBuild(String),
    ListBuilds(String),
    BuildResult(String, u32),
    StopBuild(String, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Folder,
    Job,
    /// A job that also holds child jobs, like a multi-branch pipeline
    Container,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    definition: Option<String>,
    builds: Vec<Option<BuildResult>>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            definition: None,
            builds: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    calls: Vec<RemoteCall>,
    racing_folders: HashSet<String>,
    delete_failures: HashMap<String, u16>,
    folder_failures: HashMap<String, u16>,
    listing_failures: HashMap<String, u16>,
    triggered_result: Option<BuildResult>,
}

impl State {
    fn require(&self, path: &str) -> Result<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| Error::not_found("job", path))
    }

    fn require_mut(&mut self, path: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| Error::not_found("job", path))
    }

    /// Parent scope must be the top level or an existing container
    fn require_scope(&self, scope: &str) -> Result<()> {
        if scope.is_empty() {
            return Ok(());
        }
        match self.nodes.get(scope) {
            Some(node) if node.kind != NodeKind::Job => Ok(()),
            Some(_) => Err(Error::transport(Some(400), format!("{scope} is not a folder"))),
            None => Err(Error::not_found("folder", scope)),
        }
    }

    fn children(&self, path: &str) -> Vec<String> {
        let prefix = format!("{path}/");
        self.nodes
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }

    fn insert(&mut self, scope: &str, name: &str, node: Node) -> Result<()> {
        self.require_scope(scope)?;
        let path = join(scope, name);
        if self.nodes.contains_key(&path) {
            return Err(Error::transport(
                Some(400),
                format!("A job already exists with the name '{name}'"),
            ));
        }
        self.nodes.insert(path, node);
        Ok(())
    }

    fn build_mut(&mut self, path: &str, number: u32) -> Result<&mut Option<BuildResult>> {
        let node = self.require_mut(path)?;
        number
            .checked_sub(1)
            .and_then(|i| node.builds.get_mut(i as usize))
            .ok_or_else(|| Error::not_found("build", format!("{path} #{number}")))
    }
}

/// In-memory job server with a call log and failure injection
#[derive(Debug, Default)]
pub struct MemoryJobServer {
    state: Mutex<State>,
}

impl MemoryJobServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A [`JobServer`] backed by this fake
    pub fn job_server(self: &Arc<Self>) -> JobServer {
        JobServer::new(FAKE_BASE_URL, self.clone(), self.clone())
    }

    /// Create a folder and any missing ancestors
    pub fn add_folder(&self, path: &str) {
        let mut state = self.state.lock();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = join(&current, segment);
            state
                .nodes
                .entry(current.clone())
                .or_insert_with(|| Node::new(NodeKind::Folder));
        }
    }

    pub fn add_job(&self, path: &str) {
        self.add_node(path, NodeKind::Job);
    }

    /// A multi-branch style job: buildable and holding child jobs
    pub fn add_multibranch(&self, path: &str) {
        self.add_node(path, NodeKind::Container);
    }

    /// Add a branch job under a multi-branch job
    pub fn add_branch(&self, multibranch: &str, branch: &str) {
        self.add_multibranch(multibranch);
        self.add_job(&join(multibranch, branch));
    }

    fn add_node(&self, path: &str, kind: NodeKind) {
        let (scope, _) = split_last(path);
        if !scope.is_empty() {
            self.add_folder(scope);
        }
        let mut state = self.state.lock();
        state
            .nodes
            .entry(path.to_string())
            .and_modify(|node| {
                if kind == NodeKind::Container {
                    node.kind = kind;
                }
            })
            .or_insert_with(|| Node::new(kind));
    }

    /// Append a build with the given result (`None` = still running).
    /// Returns the build number.
    pub fn add_build(&self, path: &str, result: Option<BuildResult>) -> u32 {
        let mut state = self.state.lock();
        let node = state
            .nodes
            .get_mut(path)
            .unwrap_or_else(|| panic!("no job at {path}"));
        node.builds.push(result);
        node.builds.len() as u32
    }

    pub fn finish_build(&self, path: &str, number: u32, result: BuildResult) {
        let mut state = self.state.lock();
        let build = state
            .build_mut(path, number)
            .unwrap_or_else(|e| panic!("{e}"));
        *build = Some(result);
    }

    /// Result given to builds created by `trigger_build` (default: running)
    pub fn complete_triggered_builds_with(&self, result: Option<BuildResult>) {
        self.state.lock().triggered_result = result;
    }

    /// The next folder creation at `path` succeeds remotely but reports an
    /// error, as when a concurrent client created it first.
    pub fn race_folder_creation(&self, path: &str) {
        self.state.lock().racing_folders.insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str, status: u16) {
        self.state.lock().delete_failures.insert(path.to_string(), status);
    }

    /// Folder creation at `path` fails with `status` and creates nothing
    pub fn fail_folder_creation(&self, path: &str, status: u16) {
        self.state.lock().folder_failures.insert(path.to_string(), status);
    }

    /// Listing the builds of `path` fails with `status` until cleared
    pub fn fail_list_builds(&self, path: &str, status: u16) {
        self.state.lock().listing_failures.insert(path.to_string(), status);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.delete_failures.clear();
        state.folder_failures.clear();
        state.listing_failures.clear();
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().nodes.contains_key(path)
    }

    pub fn is_folder(&self, path: &str) -> bool {
        matches!(
            self.state.lock().nodes.get(path).map(|n| n.kind),
            Some(NodeKind::Folder)
        )
    }

    pub fn definition(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .nodes
            .get(path)
            .and_then(|n| n.definition.clone())
    }

    pub fn builds(&self, path: &str) -> Vec<Option<BuildResult>> {
        self.state
            .lock()
            .nodes
            .get(path)
            .map(|n| n.builds.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: RemoteCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl JobTransport for MemoryJobServer {
    async fn get_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<Option<JobRef>> {
        let path = join(&scope_path(parent), name);
        self.record(RemoteCall::GetJob(path.clone()));
        let exists = self.state.lock().nodes.contains_key(&path);
        Ok(exists.then(|| JobRef::new(parent.cloned(), name)))
    }

    async fn folder_view(&self, job: &JobRef) -> Result<Option<FolderView>> {
        let path = job_path(job);
        self.record(RemoteCall::FolderView(path.clone()));
        let state = self.state.lock();
        let node = state.require(&path)?;
        if node.kind == NodeKind::Job {
            return Ok(None);
        }
        Ok(Some(FolderView {
            handle: FolderHandle::new(url_of(&path)),
            jobs: state.children(&path),
        }))
    }

    async fn create_job(&self, parent: Option<&FolderHandle>, name: &str, definition: &str) -> Result<()> {
        let scope = scope_path(parent);
        self.record(RemoteCall::CreateJob(join(&scope, name)));
        let kind = if definition.contains("WorkflowMultiBranchProject") {
            NodeKind::Container
        } else {
            NodeKind::Job
        };
        let mut node = Node::new(kind);
        node.definition = Some(definition.to_string());
        self.state.lock().insert(&scope, name, node)
    }

    async fn delete_job(&self, parent: Option<&FolderHandle>, name: &str) -> Result<()> {
        let path = join(&scope_path(parent), name);
        self.record(RemoteCall::DeleteJob(path.clone()));
        let mut state = self.state.lock();
        if let Some(status) = state.delete_failures.get(&path) {
            return Err(Error::transport(Some(*status), format!("cannot delete {path}")));
        }
        state.require(&path)?;
        let prefix = format!("{path}/");
        state.nodes.retain(|key, _| key != &path && !key.starts_with(&prefix));
        Ok(())
    }

    async fn trigger_build(&self, job: &JobRef) -> Result<()> {
        let path = job_path(job);
        self.record(RemoteCall::TriggerBuild(path.clone()));
        let mut state = self.state.lock();
        let result = state.triggered_result;
        let node = state.require_mut(&path)?;
        if node.kind == NodeKind::Folder {
            return Err(Error::transport(Some(405), format!("{path} is not buildable")));
        }
        node.builds.push(result);
        Ok(())
    }

    async fn list_builds(&self, job: &JobRef) -> Result<Vec<BuildHandle>> {
        let path = job_path(job);
        self.record(RemoteCall::ListBuilds(path.clone()));
        let state = self.state.lock();
        if let Some(status) = state.listing_failures.get(&path) {
            return Err(Error::transport(Some(*status), format!("cannot list builds of {path}")));
        }
        let node = state.require(&path)?;
        let url = url_of(&path);
        // newest first, like the real server
        Ok((1..=node.builds.len() as u32)
            .rev()
            .map(|number| BuildHandle {
                number,
                url: format!("{url}{number}/"),
            })
            .collect())
    }

    async fn build_result(&self, build: &BuildHandle) -> Result<Option<BuildResult>> {
        let path = build_path(build);
        self.record(RemoteCall::BuildResult(path.clone(), build.number));
        let mut state = self.state.lock();
        Ok(*state.build_mut(&path, build.number)?)
    }

    async fn stop_build(&self, build: &BuildHandle) -> Result<()> {
        let path = build_path(build);
        self.record(RemoteCall::StopBuild(path.clone(), build.number));
        let mut state = self.state.lock();
        let result = state.build_mut(&path, build.number)?;
        if result.is_none() {
            *result = Some(BuildResult::Aborted);
        }
        Ok(())
    }
}

#[async_trait]
impl FolderSubmitter for MemoryJobServer {
    async fn submit_folder_creation(
        &self,
        target_url: &str,
        name: &str,
        _definition: &str,
        _credentials: Option<&Credentials>,
    ) -> Result<()> {
        let scope = path_of(target_url);
        let path = join(&scope, name);
        self.record(RemoteCall::CreateFolder(path.clone()));

        let mut state = self.state.lock();
        if let Some(status) = state.folder_failures.get(&path) {
            return Err(Error::transport(Some(*status), format!("cannot create {path}")));
        }
        let raced = state.racing_folders.remove(&path);
        state.insert(&scope, name, Node::new(NodeKind::Folder))?;
        if raced {
            return Err(Error::transport(
                Some(400),
                format!("A job already exists with the name '{name}'"),
            ));
        }
        Ok(())
    }
}

fn join(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}/{name}")
    }
}

fn split_last(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

fn url_of(path: &str) -> String {
    let suffix: String = path
        .split('/')
        .map(|segment| format!("job/{}/", encode_segment(segment)))
        .collect();
    format!("{FAKE_BASE_URL}{suffix}")
}

/// Inverse of `url_of`; a trailing build number is dropped
fn path_of(url: &str) -> String {
    let relative = url.strip_prefix(FAKE_BASE_URL).unwrap_or(url);
    let tokens: Vec<&str> = relative.split('/').filter(|t| !t.is_empty()).collect();
    tokens
        .chunks(2)
        .filter(|pair| pair.len() == 2 && pair[0] == "job")
        .map(|pair| decode_segment(pair[1]))
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_segment(segment: &str) -> String {
    segment
        .replace("%20", " ")
        .replace("%2B", "+")
        .replace("%23", "#")
        .replace("%3F", "?")
        .replace("%25", "%")
}

fn scope_path(parent: Option<&FolderHandle>) -> String {
    parent.map(|p| path_of(p.url())).unwrap_or_default()
}

fn job_path(job: &JobRef) -> String {
    join(&scope_path(job.folder.as_ref()), &job.name)
}

fn build_path(build: &BuildHandle) -> String {
    path_of(&build.url)
}
