//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::Path;

use jobtree_client::{BuildResult, FolderPath};
use jobtree_common::{TemplateKind, TemplateParams};

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Folder holding the scenario's jobs, e.g. `teamA/projectX`
    pub folder: FolderPath,

    /// Remove the top-level folder before building the chain
    #[serde(default = "default_true")]
    pub delete_existing_root: bool,

    /// Jobs to create inside `folder`
    #[serde(default)]
    pub jobs: Vec<JobSpec>,

    /// Steps to execute in order
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,

    #[serde(default = "default_kind")]
    pub kind: TemplateKind,

    /// Template placeholders (`script`, `repo`, `command`, ...)
    #[serde(default)]
    pub params: TemplateParams,
}

fn default_kind() -> TemplateKind {
    TemplateKind::Pipeline
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Trigger a build of a job in the scenario folder
    Build { job: String },

    /// Trigger a build of one branch of a multi-branch pipeline
    BuildBranch { pipeline: String, branch: String },

    /// Wait until the latest build finishes with `result`
    WaitResult {
        job: String,
        #[serde(default = "default_result")]
        result: BuildResult,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Stop every running build under `job`
    AbortAll { job: String },

    /// Delete a job from the scenario folder
    DeleteJob { job: String },
}

fn default_result() -> BuildResult {
    BuildResult::Success
}

fn default_wait_timeout() -> u64 {
    60_000
}

impl ScenarioStep {
    /// Short label used in results and logs
    pub fn label(&self) -> String {
        match self {
            ScenarioStep::Build { job } => format!("build {job}"),
            ScenarioStep::BuildBranch { pipeline, branch } => {
                format!("build_branch {pipeline}/{branch}")
            }
            ScenarioStep::WaitResult { job, result, .. } => format!("wait_result {job} {result}"),
            ScenarioStep::AbortAll { job } => format!("abort_all {job}"),
            ScenarioStep::DeleteJob { job } => format!("delete_job {job}"),
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, sorted by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.folder.is_top_level() {
            return Err(E2eError::SpecParse(format!(
                "scenario '{}' needs a non-empty folder",
                self.name
            )));
        }
        if let Some(job) = self.jobs.iter().find(|j| j.kind == TemplateKind::Folder) {
            return Err(E2eError::SpecParse(format!(
                "job '{}' cannot use the folder template",
                job.name
            )));
        }
        Ok(())
    }
}
