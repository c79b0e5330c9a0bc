//! Build Commands

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use jobtree_client::{BuildResult, FolderPath, JobApi};

use crate::output::{print_item, print_success, result_label, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum BuildCommands {
    /// Trigger a build
    Run {
        /// Job name (the multi-branch pipeline when --branch is given)
        job: String,

        /// Folder path holding the job
        #[arg(short, long, default_value = "")]
        folder: FolderPath,

        /// Build this branch of a multi-branch pipeline
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Stop every running build of a job and everything below it
    Abort {
        /// Job or folder name
        job: String,

        /// Folder path holding the job
        #[arg(short, long, default_value = "")]
        folder: FolderPath,
    },

    /// Show the result of the latest build
    Last {
        /// Job name
        job: String,

        /// Folder path holding the job
        #[arg(short, long, default_value = "")]
        folder: FolderPath,
    },

    /// Wait until the latest build finishes with the given result
    Wait {
        /// Job name
        job: String,

        /// Folder path holding the job
        #[arg(short, long, default_value = "")]
        folder: FolderPath,

        /// Desired result
        #[arg(short, long, default_value = "SUCCESS")]
        result: BuildResult,

        /// Timeout in seconds (defaults to the configured wait timeout)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

#[derive(Serialize)]
pub struct BuildStatusDisplay {
    pub job: String,
    pub result: Option<BuildResult>,
}

impl TableDisplay for BuildStatusDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Job", "Result"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.job.clone(), result_label(self.result)]
    }
}

pub async fn execute(cmd: BuildCommands, api: JobApi, format: OutputFormat) -> Result<()> {
    match cmd {
        BuildCommands::Run { job, folder, branch } => match branch {
            Some(branch) => {
                api.builds().build_branch(&folder, &job, &branch).await?;
                print_success(&format!(
                    "Triggered {} branch {}",
                    folder.display_path(&job),
                    branch
                ));
            }
            None => {
                api.builds().build(&folder, &job).await?;
                print_success(&format!("Triggered {}", folder.display_path(&job)));
            }
        },

        BuildCommands::Abort { job, folder } => {
            let stopped = api.builds().abort_all_builds(&folder, &job).await?;
            print_success(&format!(
                "Stopped {} build(s) under {}",
                stopped,
                folder.display_path(&job)
            ));
        }

        BuildCommands::Last { job, folder } => {
            let result = api.builds().last_build_result(&folder, &job).await?;
            let display = BuildStatusDisplay {
                job: folder.display_path(&job),
                result,
            };
            print_item(&display, format);
        }

        BuildCommands::Wait {
            job,
            folder,
            result,
            timeout,
        } => {
            let timeout = timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| api.wait_timeout());
            api.builds()
                .wait_for_build_result(&folder, &job, result, timeout)
                .await?;
            print_success(&format!("{} finished with {}", folder.display_path(&job), result));
        }
    }

    Ok(())
}
