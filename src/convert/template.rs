// src/convert/template.rs

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::{Map, Value};

use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;

use super::FileConverter;

/// Key of a `TemplateVar` file naming the template to expand.
pub const TEMPLATE_KEY: &str = "template";

/// Key under which shared variables are exposed to every template.
pub const VARS_KEY: &str = "vars";

/// Expands `TemplateVar` files.
///
/// A `TemplateVar` file is a JSON object such as:
///
/// ```json
/// { "template": "page.md.tmpl", "title": "Install", "steps": ["a", "b"] }
/// ```
///
/// `template` is looked up in the template directory first, then relative to
/// the source root. Every other key becomes a template variable, and the
/// shared variables file (if configured) is available as `vars`.
#[derive(Debug, Clone)]
pub struct TemplateConverter {
    fs: Arc<dyn FileSystem>,
    source_root: PathBuf,
    template_dir: PathBuf,
    variables: Option<PathBuf>,
}

impl TemplateConverter {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        source_root: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
        variables: Option<PathBuf>,
    ) -> Self {
        Self {
            fs,
            source_root: source_root.into(),
            template_dir: template_dir.into(),
            variables,
        }
    }
}

impl FileConverter for TemplateConverter {
    fn convert(&self, source: &Path) -> Result<String> {
        let raw = self
            .fs
            .read_to_string(source)
            .map_err(|e| SyncError::SourceRead {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut object = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(render_error(source, "expected a JSON object")),
            Err(e) => return Err(render_error(source, format!("invalid JSON: {e}"))),
        };

        let name = match object.remove(TEMPLATE_KEY) {
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(render_error(source, format!("`{TEMPLATE_KEY}` must be a string")));
            }
            None => {
                return Err(render_error(source, format!("missing `{TEMPLATE_KEY}` key")));
            }
        };

        let vars = load_variables(self.fs.as_ref(), self.variables.as_deref())?;
        object.insert(VARS_KEY.to_string(), vars);

        let env = build_environment(
            Arc::clone(&self.fs),
            self.source_root.clone(),
            self.template_dir.clone(),
        );
        let template = env
            .get_template(&name)
            .map_err(|e| render_error(source, e.to_string()))?;
        template
            .render(Value::Object(object))
            .map_err(|e| render_error(source, e.to_string()))
    }
}

/// Template environment whose loader reads through `fs`.
///
/// Names resolve against `template_dir` first, then `source_root`. Names
/// that try to leave those directories are rejected. Using an undefined
/// variable fails the render.
pub fn build_environment(
    fs: Arc<dyn FileSystem>,
    source_root: PathBuf,
    template_dir: PathBuf,
) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_loader(move |name: &str| {
        let rel = Path::new(name);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("template name {name:?} escapes the source tree"),
            ));
        }

        for candidate in [template_dir.join(rel), source_root.join(rel)] {
            if fs.is_file(&candidate) {
                return fs.read_to_string(&candidate).map(Some).map_err(|e| {
                    minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("reading template {candidate:?}: {e}"),
                    )
                });
            }
        }
        Ok(None)
    });
    env
}

/// Load the shared variables file, or an empty object when none is
/// configured or the file does not exist yet.
pub fn load_variables(fs: &dyn FileSystem, path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Object(Map::new()));
    };
    if !fs.is_file(path) {
        return Ok(Value::Object(Map::new()));
    }

    let raw = fs.read_to_string(path).map_err(|e| SyncError::SourceRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| render_error(path, format!("invalid variables JSON: {e}")))
}

pub(crate) fn render_error(path: &Path, message: impl Into<String>) -> SyncError {
    SyncError::Render {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
