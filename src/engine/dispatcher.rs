// src/engine/dispatcher.rs

//! Pure per-session state machine.
//!
//! The dispatcher consumes [`WatchEvent`]s and returns the
//! [`MirrorAction`]s the IO shell should perform. It has no channels, no
//! Tokio types, and does not perform any IO, so it can be driven with
//! synthetic events in tests.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::mirror::{Filter, PathMapper};
use crate::types::{FileCategory, SessionKind, SessionState};

use super::{MirrorAction, WatchEvent};

/// Result of feeding one event to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct DispatchStep {
    pub actions: Vec<MirrorAction>,
    /// The event moved the session from `Initializing` to `Active`.
    pub became_active: bool,
    /// The event was dropped (filtered, outside the root, or session closed).
    pub skipped: bool,
}

impl DispatchStep {
    fn act(actions: Vec<MirrorAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    fn skip() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// State machine for one watch session:
/// `Initializing → Active → Closed`.
///
/// File events that arrive while `Initializing` belong to the notifier's
/// initial scan and are mirrored like any other. `Ready` activates the
/// session and, for directory sessions, schedules the skeleton build.
#[derive(Debug)]
pub struct Dispatcher {
    kind: SessionKind,
    root: PathBuf,
    mapper: PathMapper,
    filter: Filter,
    state: SessionState,
}

impl Dispatcher {
    pub fn new(kind: SessionKind, root: impl Into<PathBuf>, mapper: PathMapper, filter: Filter) -> Self {
        Self {
            kind,
            root: root.into(),
            mapper,
            filter,
            state: SessionState::Initializing,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enter the terminal state. Later events produce no actions.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    pub fn step(&mut self, event: WatchEvent) -> DispatchStep {
        if self.state == SessionState::Closed {
            debug!(?event, "session closed; dropping event");
            return DispatchStep::skip();
        }

        match event {
            WatchEvent::Ready => self.handle_ready(),
            WatchEvent::Added(path) | WatchEvent::Changed(path) => self.handle_file_write(path),
            WatchEvent::Removed(path) => self.handle_file_remove(path),
            WatchEvent::DirRemoved(path) => self.handle_dir_remove(path),
        }
    }

    fn handle_ready(&mut self) -> DispatchStep {
        if self.state != SessionState::Initializing {
            debug!("duplicate ready signal ignored");
            return DispatchStep::default();
        }

        self.state = SessionState::Active;
        info!(root = ?self.root, "initial scan finished; session active");

        let mut actions = Vec::new();
        if self.kind == SessionKind::Dir {
            actions.push(MirrorAction::BuildSkeleton {
                root: self.root.clone(),
            });
        }
        actions.push(MirrorAction::InitialSyncComplete);

        DispatchStep {
            actions,
            became_active: true,
            skipped: false,
        }
    }

    fn handle_file_write(&self, source: PathBuf) -> DispatchStep {
        let Some(rel) = self.relative(&source) else {
            return DispatchStep::skip();
        };

        let category = FileCategory::classify(&source);
        if self.filter.is_filtered(rel) {
            // Filtered templates, fragments and variables would be the place
            // to re-render the pages that use them; nothing depends on that
            // yet, so every filtered category is a no-op.
            debug!(path = ?source, ?category, "filtered; not mirrored");
            return DispatchStep::skip();
        }

        let target = match self.mapper.target_of(&source) {
            Ok(t) => t,
            Err(err) => {
                warn!(error = %err, "cannot map source path");
                return DispatchStep::skip();
            }
        };

        info!(path = ?source, "source file edited");
        let action = if category.is_rendered() {
            MirrorAction::Render {
                source,
                target,
                category,
            }
        } else {
            MirrorAction::Copy { source, target }
        };
        DispatchStep::act(vec![action])
    }

    fn handle_file_remove(&self, source: PathBuf) -> DispatchStep {
        if self.relative(&source).is_none() {
            return DispatchStep::skip();
        }
        match self.mapper.target_of(&source) {
            Ok(target) => DispatchStep::act(vec![MirrorAction::RemoveFile { source, target }]),
            Err(err) => {
                warn!(error = %err, "cannot map removed path");
                DispatchStep::skip()
            }
        }
    }

    fn handle_dir_remove(&self, source: PathBuf) -> DispatchStep {
        if self.relative(&source).is_none() {
            return DispatchStep::skip();
        }
        match self.mapper.target_dir_of(&source) {
            Ok(target) => DispatchStep::act(vec![MirrorAction::RemoveTree { source, target }]),
            Err(err) => {
                warn!(error = %err, "cannot map removed directory");
                DispatchStep::skip()
            }
        }
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        match self.mapper.relative(path) {
            Ok(rel) => Some(rel),
            Err(_) => {
                warn!(
                    "event path {:?} is outside source root {:?}; ignoring",
                    path,
                    self.mapper.source_root()
                );
                None
            }
        }
    }
}
