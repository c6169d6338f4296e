// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::Result;
use crate::mirror::{Filter, PathMapper};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "Docmirror.toml";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// source = "docs"
/// target = "site/docs"
///
/// [filter]
/// exclude_names = ["_*.md", "*.vars.json"]
/// exclude_dirs = ["_templates", "node_modules"]
///
/// [render]
/// variables = "site.vars.json"
/// ```
///
/// Only `[paths]` is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    pub paths: PathsSection,

    #[serde(default)]
    pub filter: FilterSection,

    #[serde(default)]
    pub render: RenderSection,
}

/// `[paths]` section. Relative paths resolve against the config file's
/// directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// `[filter]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Glob patterns matched against the file or directory name.
    #[serde(default = "default_exclude_names")]
    pub exclude_names: Vec<String>,

    /// Directory names excluded wherever they appear in a path.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            exclude_names: default_exclude_names(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    /// Where `TemplateVar` files look up their template, relative to the
    /// source root.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Optional shared variables file, relative to the source root.
    #[serde(default)]
    pub variables: Option<PathBuf>,

    /// Extension given to rendered `TemplateVar` targets (no leading dot).
    #[serde(default = "default_document_extension")]
    pub document_extension: String,

    /// Register the built-in rewrite rules.
    #[serde(default = "default_true")]
    pub default_rules: bool,

    /// Skip writes whose content already matches the target.
    #[serde(default = "default_true")]
    pub skip_unchanged: bool,

    /// Render markdown pages as templates (includes + `vars`).
    ///
    /// Off by default: pages often carry literal braces (Vue or Handlebars
    /// snippets, `{#anchor}` heading ids) that must come through verbatim.
    /// When on, an undefined variable is a render error, never an empty
    /// string.
    #[serde(default)]
    pub expand_documents: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            variables: None,
            document_extension: default_document_extension(),
            default_rules: true,
            skip_unchanged: true,
            expand_documents: false,
        }
    }
}

fn default_exclude_names() -> Vec<String> {
    ["_*.md", "_*.markdown", "*.vars.json", "*.tmpl", "*.j2", "*.jinja", ".DS_Store"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude_dirs() -> Vec<String> {
    ["_templates", "node_modules", ".git"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("_templates")
}

fn default_document_extension() -> String {
    "md".to_string()
}

fn default_true() -> bool {
    true
}

/// Validated configuration with absolute roots.
///
/// Built from a [`RawConfigFile`] by [`MirrorConfig::from_raw`], or directly
/// with [`MirrorConfig::new`] when the caller already has absolute paths.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub exclude_names: Vec<String>,
    pub exclude_dirs: Vec<String>,
    /// Absolute template directory.
    pub template_dir: PathBuf,
    /// Absolute path of the shared variables file.
    pub variables: Option<PathBuf>,
    pub document_extension: String,
    pub default_rules: bool,
    pub skip_unchanged: bool,
    pub expand_documents: bool,
}

impl MirrorConfig {
    /// Config with default filter and render settings.
    pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        let source_root = source_root.into();
        let filter = FilterSection::default();
        let render = RenderSection::default();
        Self {
            template_dir: source_root.join(&render.template_dir),
            source_root,
            target_root: target_root.into(),
            exclude_names: filter.exclude_names,
            exclude_dirs: filter.exclude_dirs,
            variables: None,
            document_extension: render.document_extension,
            default_rules: render.default_rules,
            skip_unchanged: render.skip_unchanged,
            expand_documents: render.expand_documents,
        }
    }

    pub fn mapper(&self) -> PathMapper {
        PathMapper::new(
            self.source_root.clone(),
            self.target_root.clone(),
            self.document_extension.clone(),
        )
    }

    pub fn filter(&self) -> Result<Filter> {
        Filter::new(&self.exclude_names, &self.exclude_dirs)
    }
}
