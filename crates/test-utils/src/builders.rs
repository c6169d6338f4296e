#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use docmirror::config::MirrorConfig;
use docmirror::convert::ConverterSet;
use docmirror::fs::mock::MockFileSystem;
use docmirror::fs::FileSystem;
use docmirror::mirror::TransformPipeline;
use docmirror::watch::WatchRegistry;

use crate::fake_converter::FakeConverter;
use crate::manual_source::ManualEventSource;

/// Builder for `MirrorConfig` to simplify test setup.
pub struct MirrorConfigBuilder {
    config: MirrorConfig,
}

impl MirrorConfigBuilder {
    pub fn new(source: &str, target: &str) -> Self {
        let mut config = MirrorConfig::new(source, target);
        // Tests opt into the built-in rules explicitly.
        config.default_rules = false;
        Self { config }
    }

    pub fn exclude_name(mut self, pattern: &str) -> Self {
        self.config.exclude_names.push(pattern.to_string());
        self
    }

    pub fn exclude_dir(mut self, name: &str) -> Self {
        self.config.exclude_dirs.push(name.to_string());
        self
    }

    pub fn no_filters(mut self) -> Self {
        self.config.exclude_names.clear();
        self.config.exclude_dirs.clear();
        self
    }

    pub fn variables(mut self, rel: &str) -> Self {
        self.config.variables = Some(self.config.source_root.join(rel));
        self
    }

    pub fn default_rules(mut self, val: bool) -> Self {
        self.config.default_rules = val;
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.config.skip_unchanged = val;
        self
    }

    pub fn expand_documents(mut self, val: bool) -> Self {
        self.config.expand_documents = val;
        self
    }

    pub fn build(self) -> MirrorConfig {
        self.config
    }
}

/// A registry wired to an in-memory filesystem and a manual event source.
pub struct MockHarness {
    pub fs: MockFileSystem,
    pub source: ManualEventSource,
    pub registry: WatchRegistry,
}

impl MockHarness {
    /// Registry over `/docs` → `/out/docs` with fake converters and an empty
    /// rule pipeline.
    pub fn new() -> Self {
        Self::with_config(MirrorConfigBuilder::new("/docs", "/out/docs").build())
    }

    pub fn with_config(config: MirrorConfig) -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir(&config.source_root);
        let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
        let source = ManualEventSource::new();
        let converters = ConverterSet::new(
            Arc::new(FakeConverter::new(Arc::clone(&shared), "doc")),
            Arc::new(FakeConverter::new(Arc::clone(&shared), "template")),
        );

        let registry = WatchRegistry::builder(config)
            .file_system(shared)
            .event_source(Arc::new(source.clone()))
            .converters(converters)
            .pipeline(TransformPipeline::new())
            .build()
            .expect("Failed to build registry for mock harness");

        Self {
            fs,
            source,
            registry,
        }
    }

    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.registry.config().source_root.join(rel)
    }

    pub fn target_path(&self, rel: &str) -> PathBuf {
        self.registry.config().target_root.join(rel)
    }
}

impl Default for MockHarness {
    fn default() -> Self {
        Self::new()
    }
}
