use std::path::Path;
use std::sync::Arc;

use docmirror::convert::FileConverter;
use docmirror::errors::{Result, SyncError};
use docmirror::fs::FileSystem;

/// Stand-in for a real renderer: wraps the source text with a label so tests
/// can tell which converter produced a target.
#[derive(Debug, Clone)]
pub struct FakeConverter {
    fs: Arc<dyn FileSystem>,
    label: String,
}

impl FakeConverter {
    pub fn new(fs: Arc<dyn FileSystem>, label: &str) -> Self {
        Self {
            fs,
            label: label.to_string(),
        }
    }

    /// What `convert` returns for `text`.
    pub fn expected(label: &str, text: &str) -> String {
        format!("<{label}>{text}</{label}>")
    }
}

impl FileConverter for FakeConverter {
    fn convert(&self, source: &Path) -> Result<String> {
        let text = self
            .fs
            .read_to_string(source)
            .map_err(|e| SyncError::SourceRead {
                path: source.to_path_buf(),
                source: e,
            })?;
        Ok(Self::expected(&self.label, &text))
    }
}

/// Converter that always fails with a render error.
#[derive(Debug, Clone, Default)]
pub struct FailingConverter;

impl FileConverter for FailingConverter {
    fn convert(&self, source: &Path) -> Result<String> {
        Err(SyncError::Render {
            path: source.to_path_buf(),
            message: "converter failure requested by test".to_string(),
        })
    }
}
