// src/watch/registry.rs

//! Ownership of watch sessions and the public mirroring operations.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MirrorConfig;
use crate::convert::{ConverterSet, MarkdownConverter, TemplateConverter};
use crate::engine::{run_session, ActionExecutor, Dispatcher, SessionChannels, SyncReport};
use crate::errors::{Result, SyncError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::mirror::{Filter, PathMapper, SharedPipeline, TransformPipeline};
use crate::types::{FileCategory, SessionId, SessionKind, SessionState};

use super::notify_source::NotifySource;
use super::source::EventSource;

struct SessionEntry {
    root: PathBuf,
    kind: SessionKind,
    stop: oneshot::Sender<()>,
    state: watch::Receiver<SessionState>,
    handle: JoinHandle<SyncReport>,
}

/// A session that has been asked to stop.
///
/// Await [`SessionClosing::wait`] to get its report once any action already
/// in progress has finished.
#[derive(Debug)]
pub struct SessionClosing {
    id: SessionId,
    handle: JoinHandle<SyncReport>,
}

impl SessionClosing {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn wait(self) -> Result<SyncReport> {
        self.handle
            .await
            .map_err(|e| SyncError::Other(anyhow::anyhow!("session {} task failed: {e}", self.id)))
    }
}

/// Owns every watch session of one mirror configuration.
///
/// Each registry is independent: it carries its own configuration, rule
/// pipeline and session table, so several can run side by side. Sessions are
/// spawned on the current Tokio runtime.
pub struct WatchRegistry {
    config: MirrorConfig,
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn EventSource>,
    mapper: PathMapper,
    filter: Filter,
    pipeline: SharedPipeline,
    executor: ActionExecutor,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("source_root", &self.config.source_root)
            .field("target_root", &self.config.target_root)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WatchRegistry`]; every collaborator has a production default.
pub struct RegistryBuilder {
    config: MirrorConfig,
    fs: Option<Arc<dyn FileSystem>>,
    source: Option<Arc<dyn EventSource>>,
    converters: Option<ConverterSet>,
    pipeline: Option<TransformPipeline>,
}

impl RegistryBuilder {
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn converters(mut self, converters: ConverterSet) -> Self {
        self.converters = Some(converters);
        self
    }

    pub fn pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn build(self) -> Result<WatchRegistry> {
        let config = self.config;
        let fs = self.fs.unwrap_or_else(|| Arc::new(RealFileSystem));
        let mapper = config.mapper();
        let filter = config.filter()?;
        let source = self.source.unwrap_or_else(|| {
            Arc::new(NotifySource::pruning(
                Arc::clone(&fs),
                mapper.clone(),
                filter.clone(),
            ))
        });
        let converters = self
            .converters
            .unwrap_or_else(|| default_converters(&config, Arc::clone(&fs)));
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| {
                if config.default_rules {
                    TransformPipeline::with_default_rules()
                } else {
                    TransformPipeline::new()
                }
            })
            .into_shared();

        let executor = ActionExecutor::new(
            Arc::clone(&fs),
            mapper.clone(),
            filter.clone(),
            converters,
            Arc::clone(&pipeline),
            config.skip_unchanged,
        );

        Ok(WatchRegistry {
            config,
            fs,
            source,
            mapper,
            filter,
            pipeline,
            executor,
            sessions: Mutex::new(HashMap::new()),
        })
    }
}

fn default_converters(config: &MirrorConfig, fs: Arc<dyn FileSystem>) -> ConverterSet {
    let document = MarkdownConverter::new(
        Arc::clone(&fs),
        config.source_root.clone(),
        config.template_dir.clone(),
        config.variables.clone(),
        config.expand_documents,
    );
    let template = TemplateConverter::new(
        fs,
        config.source_root.clone(),
        config.template_dir.clone(),
        config.variables.clone(),
    );
    ConverterSet::new(Arc::new(document), Arc::new(template))
}

impl WatchRegistry {
    pub fn builder(config: MirrorConfig) -> RegistryBuilder {
        RegistryBuilder {
            config,
            fs: None,
            source: None,
            converters: None,
            pipeline: None,
        }
    }

    /// Registry with the real filesystem, `notify` and the default converters.
    pub fn new(config: MirrorConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Begin mirroring the configured source root.
    pub fn start_dir_watch(&self) -> Result<SessionId> {
        let root = self.config.source_root.clone();
        self.start_dir_watch_at(&root)
    }

    /// Begin mirroring a directory below (or equal to) the source root.
    pub fn start_dir_watch_at(&self, root: &Path) -> Result<SessionId> {
        self.check_root(root, SessionKind::Dir)?;
        let (id, entry) = self.spawn_session(root, SessionKind::Dir, false)?;
        self.lock_sessions().insert(id, entry);
        Ok(id)
    }

    /// Begin mirroring a single file.
    pub fn start_file_watch(&self, path: &Path) -> Result<SessionId> {
        self.check_root(path, SessionKind::File)?;
        let (id, entry) = self.spawn_session(path, SessionKind::File, false)?;
        self.lock_sessions().insert(id, entry);
        Ok(id)
    }

    /// Initiate close of one session.
    pub fn stop_watch(&self, id: &SessionId) -> Result<SessionClosing> {
        let entry = self
            .lock_sessions()
            .remove(id)
            .ok_or(SyncError::SessionNotFound(*id))?;
        Ok(Self::close_entry(*id, entry))
    }

    /// Initiate close of every tracked session.
    pub fn stop_all(&self) -> Vec<SessionClosing> {
        let drained: Vec<(SessionId, SessionEntry)> = self.lock_sessions().drain().collect();
        drained
            .into_iter()
            .map(|(id, entry)| Self::close_entry(id, entry))
            .collect()
    }

    /// Mirror the whole source root once, without watching, and return the
    /// report when the initial sync is done.
    pub async fn run_once(&self) -> Result<SyncReport> {
        let root = self.config.source_root.clone();
        self.check_root(&root, SessionKind::Dir)?;
        let (id, entry) = self.spawn_session(&root, SessionKind::Dir, true)?;

        // Keep the stop sender alive so the session ends on its own terms.
        let SessionEntry { stop, handle, .. } = entry;
        let report = SessionClosing { id, handle }.wait().await;
        drop(stop);
        report
    }

    /// Current state of a tracked session.
    pub fn state_of(&self, id: &SessionId) -> Option<SessionState> {
        self.lock_sessions().get(id).map(|e| *e.state.borrow())
    }

    /// Wait until a session has left `Initializing`; returns the state it
    /// reached.
    pub async fn wait_until_active(&self, id: &SessionId) -> Result<SessionState> {
        let mut rx = self
            .lock_sessions()
            .get(id)
            .map(|e| e.state.clone())
            .ok_or(SyncError::SessionNotFound(*id))?;

        let reached = rx
            .wait_for(|s| *s != SessionState::Initializing)
            .await
            .map(|state| *state);
        match reached {
            Ok(state) => Ok(state),
            // Session task finished; whatever it left behind is final.
            Err(_) => Ok(*rx.borrow()),
        }
    }

    /// Ids of every tracked session.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.lock_sessions().keys().copied().collect()
    }

    /// Root and kind of a tracked session.
    pub fn session_root(&self, id: &SessionId) -> Option<(PathBuf, SessionKind)> {
        self.lock_sessions()
            .get(id)
            .map(|e| (e.root.clone(), e.kind))
    }

    /// Render a page with the document converter and the rule pipeline,
    /// without writing it.
    pub fn render_document(&self, path: &Path) -> Result<String> {
        let converter = Arc::clone(&self.executor.converters().document);
        self.executor.render_with(converter.as_ref(), path)
    }

    /// Expand a `TemplateVar` file with the template converter and the rule
    /// pipeline, without writing it.
    pub fn render_template(&self, path: &Path) -> Result<String> {
        let converter = Arc::clone(&self.executor.converters().template);
        self.executor.render_with(converter.as_ref(), path)
    }

    /// Add or replace a rewrite rule for every session of this registry.
    pub fn register_rule<F>(&self, mark: impl Into<String>, rule: F)
    where
        F: Fn(&Path, &str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let mark = mark.into();
        debug!(%mark, "registering rule");
        self.pipeline
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(mark, rule);
    }

    pub fn unregister_rule(&self, mark: &str) -> bool {
        self.pipeline
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(mark)
    }

    /// Marks of the registered rules in application order.
    pub fn rule_marks(&self) -> Vec<String> {
        self.pipeline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .marks()
            .to_vec()
    }

    /// Category and target of a source path, or `None` if it is filtered.
    pub fn plan(&self, source: &Path) -> Result<Option<(FileCategory, PathBuf)>> {
        let rel = self.mapper.relative(source)?;
        if self.filter.is_filtered(rel) {
            return Ok(None);
        }
        Ok(Some((FileCategory::classify(source), self.mapper.target_of(source)?)))
    }

    fn check_root(&self, root: &Path, kind: SessionKind) -> Result<()> {
        let exists = match kind {
            SessionKind::Dir => self.fs.is_dir(root),
            SessionKind::File => self.fs.is_file(root),
        };
        if !exists {
            return Err(SyncError::ConfigError(format!(
                "watch root {:?} does not exist or is not a {}",
                root,
                match kind {
                    SessionKind::Dir => "directory",
                    SessionKind::File => "file",
                }
            )));
        }
        if self.mapper.relative(root).is_err() {
            return Err(SyncError::ConfigError(format!(
                "watch root {:?} is not under source root {:?}",
                root, self.config.source_root
            )));
        }
        Ok(())
    }

    fn spawn_session(
        &self,
        root: &Path,
        kind: SessionKind,
        once: bool,
    ) -> Result<(SessionId, SessionEntry)> {
        let id = SessionId::generate();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let subscription = self.source.subscribe(root, kind, event_tx)?;
        let (stop_tx, stop_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Initializing);

        let dispatcher = Dispatcher::new(kind, root, self.mapper.clone(), self.filter.clone());
        let channels = SessionChannels {
            events: event_rx,
            stop: stop_rx,
            state: state_tx,
            subscription,
        };
        let handle = tokio::spawn(run_session(
            id,
            dispatcher,
            self.executor.clone(),
            channels,
            once,
        ));

        info!(session = %id, root = ?root, ?kind, "watch session registered");
        Ok((
            id,
            SessionEntry {
                root: root.to_path_buf(),
                kind,
                stop: stop_tx,
                state: state_rx,
                handle,
            },
        ))
    }

    fn close_entry(id: SessionId, entry: SessionEntry) -> SessionClosing {
        // The session may already have ended on its own.
        let _ = entry.stop.send(());
        info!(session = %id, "watch session closing");
        SessionClosing {
            id,
            handle: entry.handle,
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
