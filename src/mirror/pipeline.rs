// src/mirror/pipeline.rs

//! Ordered set of named content-rewrite rules.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::errors::{Result, SyncError};

/// A content rewrite: `(source path, content) -> content`.
///
/// Rules must be pure in their two inputs. Running the whole pipeline over
/// its own output has to give the same output again, because one file is
/// reprocessed on every change event.
pub type RuleFn = Arc<dyn Fn(&Path, &str) -> anyhow::Result<String> + Send + Sync>;

/// Pipeline shared by every session of a registry.
pub type SharedPipeline = Arc<RwLock<TransformPipeline>>;

/// Rules keyed by mark, applied in first-registration order.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    order: Vec<String>,
    rules: HashMap<String, RuleFn>,
}

impl fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("order", &self.order)
            .finish()
    }
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline pre-loaded with the built-in rules from [`super::rules`].
    pub fn with_default_rules() -> Self {
        let mut pipeline = Self::new();
        super::rules::register_defaults(&mut pipeline);
        pipeline
    }

    /// Insert or replace the rule under `mark`.
    ///
    /// Replacing keeps the mark's original position.
    pub fn register<F>(&mut self, mark: impl Into<String>, rule: F)
    where
        F: Fn(&Path, &str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register_arc(mark, Arc::new(rule));
    }

    pub fn register_arc(&mut self, mark: impl Into<String>, rule: RuleFn) {
        let mark = mark.into();
        if self.rules.insert(mark.clone(), rule).is_none() {
            self.order.push(mark);
        }
    }

    /// Remove a rule. Returns false if `mark` was not registered.
    pub fn unregister(&mut self, mark: &str) -> bool {
        if self.rules.remove(mark).is_none() {
            return false;
        }
        self.order.retain(|m| m != mark);
        true
    }

    /// Marks in application order.
    pub fn marks(&self) -> &[String] {
        &self.order
    }

    pub fn into_shared(self) -> SharedPipeline {
        Arc::new(RwLock::new(self))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fold every rule over `content`. The first failing rule aborts.
    pub fn apply(&self, source: &Path, content: String) -> Result<String> {
        let mut content = content;
        for mark in &self.order {
            let Some(rule) = self.rules.get(mark) else {
                continue;
            };
            content = rule(source, &content).map_err(|source_err| SyncError::Rule {
                mark: mark.clone(),
                path: source.to_path_buf(),
                source: source_err,
            })?;
        }
        Ok(content)
    }
}
