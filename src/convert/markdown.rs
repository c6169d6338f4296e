// src/convert/markdown.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;

use super::template::{build_environment, load_variables, render_error, VARS_KEY};
use super::FileConverter;

/// Renders markdown pages.
///
/// With `expand` enabled the page is treated as a template: fragments can be
/// pulled in with `{% include "_intro.md" %}` and shared variables are
/// reachable as `{{ vars.name }}`. Without it the page text passes through
/// unchanged.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    fs: Arc<dyn FileSystem>,
    source_root: PathBuf,
    template_dir: PathBuf,
    variables: Option<PathBuf>,
    expand: bool,
}

impl MarkdownConverter {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source_root: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
        variables: Option<PathBuf>,
        expand: bool,
    ) -> Self {
        Self {
            fs,
            source_root: source_root.into(),
            template_dir: template_dir.into(),
            variables,
            expand,
        }
    }
}

impl FileConverter for MarkdownConverter {
    fn convert(&self, source: &Path) -> Result<String> {
        let text = self
            .fs
            .read_to_string(source)
            .map_err(|e| SyncError::SourceRead {
                path: source.to_path_buf(),
                source: e,
            })?;

        if !self.expand {
            return Ok(text);
        }

        let vars = load_variables(self.fs.as_ref(), self.variables.as_deref())?;
        let env = build_environment(
            Arc::clone(&self.fs),
            self.source_root.clone(),
            self.template_dir.clone(),
        );
        let mut ctx = serde_json::Map::new();
        ctx.insert(VARS_KEY.to_string(), vars);
        ctx.insert("path".to_string(), json!(source.to_string_lossy()));

        env.render_str(&text, serde_json::Value::Object(ctx))
            .map_err(|e| render_error(source, e.to_string()))
    }
}
