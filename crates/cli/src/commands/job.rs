//! Job Commands

use anyhow::{bail, Result};
use clap::Subcommand;

use jobtree_client::{FolderPath, JobApi};
use jobtree_common::{TemplateKind, TemplateParams};

use crate::output::{print_success, OutputFormat};

#[derive(Subcommand)]
pub enum JobCommands {
    /// Create (or replace) a job from a template
    Create {
        /// Job name
        name: String,

        /// Folder path holding the job; empty for top level
        #[arg(short, long, default_value = "")]
        folder: FolderPath,

        /// Template kind (pipeline, multibranch, freestyle)
        #[arg(short, long, default_value = "pipeline")]
        kind: TemplateKind,

        /// Main template parameter: script, repository or command
        #[arg(long)]
        value: Option<String>,

        /// Extra template parameters as key=value
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Create missing folders
        #[arg(long)]
        create_folders: bool,
    },

    /// Delete a job; a missing job is not an error
    Delete {
        /// Job name
        name: String,

        /// Folder path holding the job; empty for top level
        #[arg(short, long, default_value = "")]
        folder: FolderPath,
    },
}

fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

fn template_params(
    kind: TemplateKind,
    value: Option<String>,
    extra: Vec<(String, String)>,
) -> Result<TemplateParams> {
    let mut params: TemplateParams = extra.into_iter().collect();
    if let Some(value) = value {
        match kind.primary_param() {
            Some(key) => {
                params.insert(key.to_string(), value);
            }
            None => bail!("{} templates take no main parameter", kind),
        }
    }
    Ok(params)
}

pub async fn execute(cmd: JobCommands, api: JobApi, _format: OutputFormat) -> Result<()> {
    match cmd {
        JobCommands::Create {
            name,
            folder,
            kind,
            value,
            params,
            create_folders,
        } => {
            let params = template_params(kind, value, params)?;
            let handle = api.folder(&folder, create_folders).await?;
            api.lifecycle()
                .create_job(kind, handle.as_ref(), &name, &params)
                .await?;
            print_success(&format!("Created {} job {}", kind, folder.display_path(&name)));
        }

        JobCommands::Delete { name, folder } => {
            let handle = api.folder(&folder, false).await?;
            api.lifecycle().delete_job(handle.as_ref(), &name).await?;
            print_success(&format!("Job deleted: {}", folder.display_path(&name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("branch=main").unwrap(),
            ("branch".to_string(), "main".to_string())
        );
        assert_eq!(
            parse_param("cmd=a=b").unwrap(),
            ("cmd".to_string(), "a=b".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_template_params_main_value() {
        let params = template_params(
            TemplateKind::Multibranch,
            Some("/srv/git/app.git".into()),
            vec![("label".into(), "linux".into())],
        )
        .unwrap();
        assert_eq!(params["repo"], "/srv/git/app.git");
        assert_eq!(params["label"], "linux");

        assert!(template_params(TemplateKind::Folder, Some("x".into()), vec![]).is_err());
    }
}
