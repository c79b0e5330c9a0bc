//! jobtree client
//!
//! Keeps a remote folder/job hierarchy in line with a declared layout and
//! observes build outcomes by polling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  JobApi                                                     │
//! │    ├── LifecycleManager   create/delete jobs and folders    │
//! │    ├── BuildController    build, build_branch, abort_all    │
//! │    │     └── ConditionPoller   fixed-interval waits         │
//! │    └── PathResolver       FolderPath -> FolderHandle        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  JobServer                                                  │
//! │    ├── JobTransport     (JenkinsHttp | MemoryJobServer)     │
//! │    ├── FolderSubmitter  (JenkinsHttp | MemoryJobServer)     │
//! │    └── TemplateSource   (embedded | directory)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached locally: each operation re-reads the server.

pub mod api;
pub mod build;
#[cfg(any(test, feature = "test-util"))]
pub mod fakes;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod poller;
pub mod remote;
pub mod resolver;
pub mod transport;

pub use api::JobApi;
pub use build::{BuildController, BuildResultCondition};
pub use http::JenkinsHttp;
pub use lifecycle::LifecycleManager;
pub use model::{BuildHandle, BuildResult, FolderHandle, FolderPath, FolderView, JobRef};
pub use poller::{ConditionPoller, PollOutcome};
pub use remote::JobServer;
pub use resolver::PathResolver;
pub use transport::{FolderSubmitter, JobTransport};
