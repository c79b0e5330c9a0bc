//! Folder Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use jobtree_client::{FolderHandle, FolderPath, JobApi};

use crate::output::{print_item, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Resolve a folder path to its URL
    Resolve {
        /// Slash-separated folder path (e.g. teamA/projectX)
        path: FolderPath,

        /// Create missing folders along the way
        #[arg(long)]
        create: bool,
    },

    /// Create every folder of a path, one inside the other
    Create {
        /// Slash-separated folder path
        path: FolderPath,

        /// Delete the top-level folder first
        #[arg(long)]
        clean: bool,
    },

    /// Delete a top-level folder and everything in it
    Delete {
        /// Single-segment folder path
        path: FolderPath,
    },
}

#[derive(Serialize)]
pub struct FolderDisplay {
    pub path: String,
    pub url: String,
}

impl FolderDisplay {
    fn new(path: &FolderPath, handle: &FolderHandle) -> Self {
        Self {
            path: path.to_string(),
            url: handle.url().to_string(),
        }
    }
}

impl TableDisplay for FolderDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Path", "URL"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.path.clone(), self.url.clone()]
    }
}

pub async fn execute(cmd: FolderCommands, api: JobApi, format: OutputFormat) -> Result<()> {
    match cmd {
        FolderCommands::Resolve { path, create } => match api.folder(&path, create).await? {
            Some(handle) => print_item(&FolderDisplay::new(&path, &handle), format),
            None => print_warning("Top-level path has no folder"),
        },

        FolderCommands::Create { path, clean } => {
            let handle = api.lifecycle().create_folder_chain(&path, clean).await?;
            print_item(&FolderDisplay::new(&path, &handle), format);
        }

        FolderCommands::Delete { path } => {
            api.lifecycle().delete_folder_path(&path).await?;
            print_success(&format!("Folder deleted: {}", path));
        }
    }

    Ok(())
}
