//! jobtree CLI - Main Entry Point
//!
//! Creates and deletes folders and jobs on a Jenkins-style server, triggers
//! and aborts builds, and waits on build results.

use clap::{Parser, Subcommand};

use jobtree_cli::commands::{build, folder, job};
use jobtree_cli::connection::ConnectionArgs;
use jobtree_cli::output::{self, print_error};

/// jobtree - keep Jenkins folder/job hierarchies in shape
#[derive(Parser)]
#[command(name = "jobtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage folders
    #[command(subcommand)]
    Folder(folder::FolderCommands),

    /// Manage jobs
    #[command(subcommand)]
    Job(job::JobCommands),

    /// Trigger, abort and watch builds
    #[command(subcommand)]
    Build(build::BuildCommands),

    /// Show the effective server settings
    Config,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Folder(cmd) => folder::execute(cmd, cli.connection.connect()?, cli.format).await?,
        Commands::Job(cmd) => job::execute(cmd, cli.connection.connect()?, cli.format).await?,
        Commands::Build(cmd) => build::execute(cmd, cli.connection.connect()?, cli.format).await?,
        Commands::Config => {
            let config = cli.connection.server_config()?;
            println!("URL:           {}", config.normalized_base_url());
            match &config.credentials {
                Some(c) => println!("User:          {}", c.username),
                None => println!("User:          (anonymous)"),
            }
            println!("Poll interval: {:?}", config.poll_interval());
            println!("Wait timeout:  {:?}", config.wait_timeout());
        }
        Commands::Version => {
            println!("jobtree CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Core library v{}", jobtree_common::VERSION);
        }
    }

    Ok(())
}
