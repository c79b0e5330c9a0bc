//! Shipped scenarios run against the in-memory job server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use jobtree_client::fakes::{MemoryJobServer, RemoteCall};
use jobtree_client::{BuildResult, ConditionPoller, JobApi};
use jobtree_e2e::runner::write_results;
use jobtree_e2e::{RunnerConfig, ScenarioRunner, ScenarioSpec, StepStatus, SuiteResult};

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios")
}

fn runner(fake: &Arc<MemoryJobServer>) -> ScenarioRunner {
    let api = JobApi::new(fake.job_server(), ConditionPoller::new(Duration::from_millis(500)));
    ScenarioRunner::new(
        api,
        RunnerConfig {
            specs_dir: scenarios_dir(),
            output_dir: std::env::temp_dir().join("jobtree-e2e-unused"),
        },
    )
}

#[test]
fn shipped_scenarios_parse() {
    let specs = ScenarioSpec::load_all(&scenarios_dir()).unwrap();
    let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, ["abort-running", "freestyle-cleanup", "pipeline-smoke"]);
    assert_eq!(ScenarioSpec::filter_by_tag(&specs, "smoke").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn suite_separates_timeouts_from_passes() {
    let fake = MemoryJobServer::new();
    fake.complete_triggered_builds_with(Some(BuildResult::Success));

    let suite = runner(&fake).run_all().await.unwrap();

    assert_eq!(suite.total, 3);
    assert_eq!(suite.passed, 2);
    assert_eq!(suite.failed, 0);
    assert_eq!(suite.timed_out, 1);
    assert!(!suite.success());

    // builds finish instantly here, so there is nothing left to abort
    let abort = &suite.results[0];
    assert_eq!(abort.name, "abort-running");
    assert_eq!(abort.steps[2].detail.as_deref(), Some("stopped 0 build(s)"));
    assert_eq!(abort.steps[3].status, StepStatus::TimedOut);

    assert!(fake.is_folder("teamA/projectX"));
    assert_eq!(fake.builds("teamA/projectX/build"), vec![Some(BuildResult::Success)]);
    assert!(fake.is_folder("teamB"));
    assert!(!fake.exists("teamB/smoke"));
}

#[tokio::test(start_paused = true)]
async fn abort_scenario_stops_running_build() {
    let fake = MemoryJobServer::new();

    let suite = runner(&fake).run_named("abort-running").await.unwrap();

    assert!(suite.success(), "{:?}", suite.results[0].error);
    let steps = &suite.results[0].steps;
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0].step, "setup");
    assert_eq!(steps[2].detail.as_deref(), Some("stopped 1 build(s)"));
    assert_eq!(
        fake.builds("teamC/longrun/sleeper"),
        vec![Some(BuildResult::Aborted)]
    );
}

#[tokio::test(start_paused = true)]
async fn wrong_result_stops_remaining_steps() {
    let fake = MemoryJobServer::new();
    fake.complete_triggered_builds_with(Some(BuildResult::Failure));

    let suite = runner(&fake).run_named("freestyle-cleanup").await.unwrap();

    let result = &suite.results[0];
    assert!(!result.success);
    assert!(result.timed_out());
    // setup, build, wait; the deletes never run
    assert_eq!(result.steps.len(), 3);
    assert!(result.error.as_deref().unwrap().starts_with("wait_result smoke SUCCESS"));
    assert!(fake.exists("teamB/smoke"));
}

#[tokio::test]
async fn failed_setup_skips_steps() {
    let fake = MemoryJobServer::new();
    fake.add_folder("teamA");
    fake.fail_delete("teamA", 500);

    let suite = runner(&fake).run_named("pipeline-smoke").await.unwrap();

    assert_eq!(suite.failed, 1);
    assert_eq!(suite.timed_out, 0);
    let steps = &suite.results[0].steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].status, StepStatus::Failed);
    assert_eq!(fake.count_calls(|c| matches!(c, RemoteCall::TriggerBuild(_))), 0);
}

#[tokio::test]
async fn unknown_scenario_is_an_error() {
    let fake = MemoryJobServer::new();
    assert!(runner(&fake).run_named("nope").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn results_are_written_as_json() {
    let fake = MemoryJobServer::new();
    fake.complete_triggered_builds_with(Some(BuildResult::Success));
    let suite = runner(&fake).run_tagged("smoke").await.unwrap();
    assert_eq!(suite.total, 2);

    let out = tempfile::tempdir().unwrap();
    let path = write_results(out.path(), &suite).unwrap();

    assert_eq!(path.file_name().unwrap(), "scenario-results.json");
    let parsed: SuiteResult = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.passed, 2);
    assert_eq!(parsed.results[0].steps[0].status, StepStatus::Passed);
}
