//! jobtree scenario framework
//!
//! Drives a job server through declarative YAML scenarios:
//! - Waits for the server to answer before a run
//! - Builds the scenario's folder chain and jobs from templates
//! - Triggers, aborts and waits on builds step by step
//! - Records per-step results as JSON
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Scenario Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  JenkinsProbe::wait_until_ready()                           │
//! │  ScenarioRunner                                             │
//! │    ├── apply_target_state(spec)   folder chain + jobs       │
//! │    ├── execute_step(step) -> StepResult                     │
//! │    └── write_results() -> scenario-results.json             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioSpec (YAML)                                        │
//! │    ├── name, description, tags                              │
//! │    ├── folder, delete_existing_root                         │
//! │    ├── jobs: [{ name, kind, params }]                       │
//! │    └── steps: [Step]                                        │
//! │          ├── build { job }                                  │
//! │          ├── build_branch { pipeline, branch }              │
//! │          ├── wait_result { job, result, timeout_ms }        │
//! │          ├── abort_all { job }                              │
//! │          └── delete_job { job }                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::{RunnerConfig, ScenarioResult, ScenarioRunner, StepResult, StepStatus, SuiteResult};
pub use server::JenkinsProbe;
pub use spec::{JobSpec, ScenarioSpec, ScenarioStep};
