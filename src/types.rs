// src/types.rs

use std::fmt;
use std::path::Path;

use uuid::Uuid;

/// Content category of a source file.
///
/// Determined from the file name only, so the category of a path never
/// changes between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// Markdown page rendered by the document converter.
    NormalDoc,
    /// JSON file naming a template plus the values to expand it with. Its
    /// target is written with the document extension.
    TemplateVar,
    /// Template source (`*.tmpl`, `*.j2`, `*.jinja`).
    Template,
    /// Markdown partial (`_*.md`) meant to be included by other pages.
    Fragment,
    /// Shared variables (`*.vars.json`).
    Variable,
    /// Anything else; copied byte-for-byte.
    Other,
}

impl FileCategory {
    pub fn classify(path: &Path) -> Self {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_lowercase(),
            None => return FileCategory::Other,
        };

        if name.ends_with(".vars.json") {
            return FileCategory::Variable;
        }
        if name.ends_with(".json") {
            return FileCategory::TemplateVar;
        }
        if name.ends_with(".tmpl") || name.ends_with(".j2") || name.ends_with(".jinja") {
            return FileCategory::Template;
        }
        if name.ends_with(".md") || name.ends_with(".markdown") {
            if name.starts_with('_') {
                return FileCategory::Fragment;
            }
            return FileCategory::NormalDoc;
        }
        FileCategory::Other
    }

    /// Whether files of this category go through a converter and the rule
    /// pipeline (as opposed to a verbatim copy).
    pub fn is_rendered(self) -> bool {
        match self {
            FileCategory::NormalDoc | FileCategory::TemplateVar => true,
            FileCategory::Template
            | FileCategory::Fragment
            | FileCategory::Variable
            | FileCategory::Other => false,
        }
    }
}

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Subscribed; the notifier is still reporting its initial scan.
    Initializing,
    /// Initial scan finished; live events are being mirrored.
    Active,
    /// Terminal. No further events are processed.
    Closed,
}

/// What a session watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Dir,
    File,
}

/// Opaque identifier of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
