//! Job definition templates
//!
//! Job and folder definitions are XML payloads with `{{key}}` placeholders.
//! The payload is sent to the job server verbatim after substitution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Placeholder values keyed by name (without braces)
pub type TemplateParams = BTreeMap<String, String>;

/// The kinds of definitions the job API knows how to submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Pipeline,
    #[serde(alias = "multi_branch")]
    Multibranch,
    Freestyle,
    Folder,
}

impl TemplateKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::Pipeline => "pipeline.xml",
            TemplateKind::Multibranch => "multibranch.xml",
            TemplateKind::Freestyle => "freestyle.xml",
            TemplateKind::Folder => "folder.xml",
        }
    }

    /// Name of the placeholder carrying the kind's main parameter
    pub fn primary_param(&self) -> Option<&'static str> {
        match self {
            TemplateKind::Pipeline => Some("script"),
            TemplateKind::Multibranch => Some("repo"),
            TemplateKind::Freestyle => Some("command"),
            TemplateKind::Folder => None,
        }
    }

    /// Multi-branch jobs only discover their branches once built
    pub fn triggers_initial_build(&self) -> bool {
        matches!(self, TemplateKind::Multibranch)
    }

    fn embedded(&self) -> &'static str {
        match self {
            TemplateKind::Pipeline => include_str!("../templates/pipeline.xml"),
            TemplateKind::Multibranch => include_str!("../templates/multibranch.xml"),
            TemplateKind::Freestyle => include_str!("../templates/freestyle.xml"),
            TemplateKind::Folder => include_str!("../templates/folder.xml"),
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Pipeline => write!(f, "pipeline"),
            TemplateKind::Multibranch => write!(f, "multibranch"),
            TemplateKind::Freestyle => write!(f, "freestyle"),
            TemplateKind::Folder => write!(f, "folder"),
        }
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pipeline" => Ok(TemplateKind::Pipeline),
            "multibranch" | "multi_branch" | "multi-branch" => Ok(TemplateKind::Multibranch),
            "freestyle" | "free_style" | "free-style" => Ok(TemplateKind::Freestyle),
            "folder" => Ok(TemplateKind::Folder),
            other => Err(Error::Template(format!("unknown template kind '{other}'"))),
        }
    }
}

/// Source of rendered job definitions
pub trait TemplateSource: Send + Sync {
    fn render(&self, kind: TemplateKind, params: &TemplateParams) -> Result<String>;
}

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

impl TemplateSource for EmbeddedTemplates {
    fn render(&self, kind: TemplateKind, params: &TemplateParams) -> Result<String> {
        Ok(substitute(kind.embedded(), params))
    }
}

/// Templates read from `<dir>/<kind>.xml`, falling back to the embedded copy
/// when a file is absent.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::Template(format!(
                "template directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateSource for DirectoryTemplates {
    fn render(&self, kind: TemplateKind, params: &TemplateParams) -> Result<String> {
        let path = self.dir.join(kind.file_name());
        let template = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} override in {}, using built-in", kind, self.dir.display());
                kind.embedded().to_string()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(substitute(&template, params))
    }
}

/// Build a parameter map holding only the kind's primary parameter
pub fn primary_params(kind: TemplateKind, value: &str) -> TemplateParams {
    let mut params = TemplateParams::new();
    if let Some(key) = kind.primary_param() {
        params.insert(key.to_string(), value.to_string());
    }
    params
}

/// Replace every `{{key}}` with its value. Unknown placeholders are left as-is.
///
/// The template is scanned once, so inserted values are never substituted
/// again.
pub fn substitute(template: &str, params: &TemplateParams) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}").and_then(|close| Some((close, params.get(&after[..close])?))) {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let params = primary_params(TemplateKind::Pipeline, "echo hi");
        let out = substitute("<a>{{script}}</a><b>{{script}}</b>{{other}}", &params);
        assert_eq!(out, "<a>echo hi</a><b>echo hi</b>{{other}}");
    }

    #[test]
    fn test_substituted_values_are_inserted_verbatim() {
        let mut params = TemplateParams::new();
        params.insert("command".into(), "echo {{script}}".into());
        params.insert("script".into(), "X".into());

        let out = substitute("<c>{{command}}</c><s>{{script}}</s>", &params);
        assert_eq!(out, "<c>echo {{script}}</c><s>X</s>");
    }

    #[test]
    fn test_substitute_skips_unclosed_and_unknown_braces() {
        let params = primary_params(TemplateKind::Freestyle, "make");
        assert_eq!(substitute("{{nope{{command}}", &params), "{{nopemake");
        assert_eq!(substitute("a {{command", &params), "a {{command");
    }

    #[test]
    fn test_embedded_pipeline_renders_script() {
        let params = primary_params(TemplateKind::Pipeline, "node { echo 'ok' }");
        let xml = EmbeddedTemplates.render(TemplateKind::Pipeline, &params).unwrap();
        assert!(xml.contains("<script>node { echo 'ok' }</script>"));
        assert!(!xml.contains("{{script}}"));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("multi-branch".parse::<TemplateKind>().unwrap(), TemplateKind::Multibranch);
        assert_eq!("Freestyle".parse::<TemplateKind>().unwrap(), TemplateKind::Freestyle);
        assert!("matrix".parse::<TemplateKind>().is_err());
        assert!(TemplateKind::Multibranch.triggers_initial_build());
        assert!(!TemplateKind::Pipeline.triggers_initial_build());
    }

    #[test]
    fn test_directory_override_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("freestyle.xml"), "<custom>{{command}}</custom>").unwrap();

        let templates = DirectoryTemplates::new(dir.path()).unwrap();
        let custom = templates
            .render(TemplateKind::Freestyle, &primary_params(TemplateKind::Freestyle, "make"))
            .unwrap();
        assert_eq!(custom, "<custom>make</custom>");

        let folder = templates
            .render(TemplateKind::Folder, &TemplateParams::new())
            .unwrap();
        assert!(folder.contains("com.cloudbees.hudson.plugins.folder.Folder"));
    }

    #[test]
    fn test_missing_directory_rejected() {
        assert!(DirectoryTemplates::new("/definitely/not/here").is_err());
    }
}
