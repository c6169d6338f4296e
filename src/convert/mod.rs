// src/convert/mod.rs

//! Content producers for rendered file categories.
//!
//! The executor never renders anything itself: it asks the [`ConverterSet`]
//! for the converter that matches a file's [`FileCategory`], and the
//! converter turns the source file into text. The rule pipeline runs on that
//! text afterwards.
//!
//! - [`markdown`] renders pages (`NormalDoc`).
//! - [`template`] expands `TemplateVar` JSON files through a named template.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::errors::Result;
use crate::types::FileCategory;

pub mod markdown;
pub mod template;

pub use markdown::MarkdownConverter;
pub use template::TemplateConverter;

/// Turns one source file into text.
///
/// Read failures should surface as `SyncError::SourceRead` and conversion
/// failures as `SyncError::Render`.
pub trait FileConverter: Send + Sync + Debug {
    fn convert(&self, source: &Path) -> Result<String>;
}

/// Converters for every rendered category.
#[derive(Debug, Clone)]
pub struct ConverterSet {
    pub document: Arc<dyn FileConverter>,
    pub template: Arc<dyn FileConverter>,
}

impl ConverterSet {
    pub fn new(document: Arc<dyn FileConverter>, template: Arc<dyn FileConverter>) -> Self {
        Self { document, template }
    }

    /// The converter for `category`, or `None` when files of that category
    /// are copied verbatim.
    pub fn for_category(&self, category: FileCategory) -> Option<&Arc<dyn FileConverter>> {
        match category {
            FileCategory::NormalDoc => Some(&self.document),
            FileCategory::TemplateVar => Some(&self.template),
            FileCategory::Template
            | FileCategory::Fragment
            | FileCategory::Variable
            | FileCategory::Other => None,
        }
    }
}
