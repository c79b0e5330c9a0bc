//! Scenario runner: applies a scenario's target state and executes its steps

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use jobtree_client::{FolderPath, JobApi};

use crate::error::{E2eError, E2eResult};
use crate::spec::{ScenarioSpec, ScenarioStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    TimedOut,
}

/// Result of a single step (the setup phase counts as a step)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    fn from_outcome(step: String, started: Instant, outcome: E2eResult<Option<String>>) -> Self {
        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(detail) => Self {
                step,
                status: StepStatus::Passed,
                duration_ms,
                detail,
                error: None,
            },
            Err(e) => Self {
                step,
                status: if e.is_timeout() {
                    StepStatus::TimedOut
                } else {
                    StepStatus::Failed
                },
                duration_ms,
                detail: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn success(&self) -> bool {
        self.status == StepStatus::Passed
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn timed_out(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::TimedOut)
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.timed_out == 0
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("crates/e2e/scenarios"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Runs scenarios one after another against a single job server
pub struct ScenarioRunner {
    api: JobApi,
    specs_dir: PathBuf,
    output_dir: PathBuf,
}

impl ScenarioRunner {
    pub fn new(api: JobApi, config: RunnerConfig) -> Self {
        Self {
            api,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    pub fn api(&self) -> &JobApi {
        &self.api
    }

    /// Run every scenario in the scenarios directory
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;
        Ok(self.run_specs(std::slice::from_ref(&spec)).await)
    }

    /// Run a list of scenarios, sequentially
    pub async fn run_specs(&self, specs: &[ScenarioSpec]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let (mut passed, mut failed, mut timed_out) = (0, 0, 0);

        info!("Running {} scenario(s)...", specs.len());

        for spec in specs {
            let result = self.run_scenario(spec).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                if result.timed_out() {
                    timed_out += 1;
                } else {
                    failed += 1;
                }
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario Results: {} passed, {} failed, {} timed out ({} ms)",
            passed, failed, timed_out, duration_ms
        );

        SuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            timed_out,
            duration_ms,
            results,
        }
    }

    /// Run one scenario: set up its folder and jobs, then its steps until
    /// the first failure
    pub async fn run_scenario(&self, spec: &ScenarioSpec) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let mut steps = Vec::with_capacity(spec.steps.len() + 1);
        let setup_started = Instant::now();
        let setup = self.apply_target_state(spec).await;
        steps.push(StepResult::from_outcome("setup".into(), setup_started, setup));

        if steps[0].success() {
            for step in &spec.steps {
                let step_started = Instant::now();
                let outcome = self.execute_step(&spec.folder, step).await;
                let result = StepResult::from_outcome(step.label(), step_started, outcome);
                let stop = !result.success();
                steps.push(result);
                if stop {
                    break;
                }
            }
        }

        let error = steps
            .iter()
            .find(|s| !s.success())
            .map(|s| format!("{}: {}", s.step, s.error.as_deref().unwrap_or("failed")));

        ScenarioResult {
            name: spec.name.clone(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error,
        }
    }

    async fn apply_target_state(&self, spec: &ScenarioSpec) -> E2eResult<Option<String>> {
        let folder = self
            .api
            .lifecycle()
            .create_folder_chain(&spec.folder, spec.delete_existing_root)
            .await?;

        for job in &spec.jobs {
            self.api
                .lifecycle()
                .create_job(job.kind, Some(&folder), &job.name, &job.params)
                .await?;
        }

        Ok(Some(format!("{} job(s) in {}", spec.jobs.len(), spec.folder)))
    }

    async fn execute_step(&self, folder: &FolderPath, step: &ScenarioStep) -> E2eResult<Option<String>> {
        let builds = self.api.builds();
        match step {
            ScenarioStep::Build { job } => {
                builds.build(folder, job).await?;
                Ok(None)
            }
            ScenarioStep::BuildBranch { pipeline, branch } => {
                builds.build_branch(folder, pipeline, branch).await?;
                Ok(None)
            }
            ScenarioStep::WaitResult {
                job,
                result,
                timeout_ms,
            } => {
                builds
                    .wait_for_build_result(folder, job, *result, Duration::from_millis(*timeout_ms))
                    .await?;
                Ok(None)
            }
            ScenarioStep::AbortAll { job } => {
                let stopped = builds.abort_all_builds(folder, job).await?;
                Ok(Some(format!("stopped {stopped} build(s)")))
            }
            ScenarioStep::DeleteJob { job } => {
                let handle = self.api.folder(folder, false).await?;
                self.api.lifecycle().delete_job(handle.as_ref(), job).await?;
                Ok(None)
            }
        }
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.output_dir, results)
    }
}

pub fn write_results(output_dir: &Path, results: &SuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("scenario-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
