//! Scenario harness entry point
//!
//! This file is the test binary that runs scenarios from YAML specs against
//! a live job server. It is a no-op unless JOBTREE_URL (or --url) is set.
//! Run with: cargo test --package jobtree-e2e --test e2e

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobtree_client::JobApi;
use jobtree_common::ServerConfig;
use jobtree_e2e::{E2eResult, JenkinsProbe, RunnerConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "jobtree-e2e")]
#[command(about = "Scenario runner for jobtree")]
struct Args {
    /// Path to scenario specs directory
    #[arg(short, long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios"))]
    specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Job server base URL
    #[arg(long, env = "JOBTREE_URL")]
    url: Option<String>,

    /// Seconds to wait for the server to answer
    #[arg(long, default_value = "120")]
    ready_timeout: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // cargo passes libtest flags such as --nocapture; keep only ours
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => Args::parse_from(["jobtree-e2e"]),
    };

    if args.url.is_none() {
        eprintln!("JOBTREE_URL not set; skipping live scenarios");
        return;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut config = ServerConfig::from_env()?;
    if let Some(url) = args.url {
        config.base_url = url;
    }

    JenkinsProbe::new(&config)?
        .wait_until_ready(Duration::from_secs(args.ready_timeout))
        .await?;

    let runner = ScenarioRunner::new(
        JobApi::connect(&config)?,
        RunnerConfig {
            specs_dir: args.specs,
            output_dir: args.output,
        },
    );

    let results = if let Some(name) = args.name {
        runner.run_named(&name).await?
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.success())
}
