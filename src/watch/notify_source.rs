// src/watch/notify_source.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::WatchEvent;
use crate::errors::{Result, SyncError};
use crate::fs::FileSystem;
use crate::mirror::{Filter, PathMapper};
use crate::types::SessionKind;

use super::source::{EventSource, Subscription};

/// Decides which directories a scan never descends into.
pub type PruneFn = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// [`EventSource`] backed by the platform watcher from `notify`.
///
/// `subscribe` returns at once. Registering the watcher and the initial scan
/// run on Tokio's blocking pool, so the caller never waits for a tree walk.
/// The watcher is registered before the scan so that nothing edited during
/// the scan is lost; such an edit may show up twice, which is harmless
/// because mirroring a file is idempotent.
#[derive(Clone)]
pub struct NotifySource {
    fs: Arc<dyn FileSystem>,
    prune: PruneFn,
}

impl fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifySource")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl NotifySource {
    /// Source whose scans skip directories the filter excludes, such as
    /// `node_modules` or `.git`.
    pub fn pruning(fs: Arc<dyn FileSystem>, mapper: PathMapper, filter: Filter) -> Self {
        Self {
            fs,
            prune: Arc::new(move |dir: &Path| {
                mapper
                    .relative(dir)
                    .map(|rel| filter.excludes_dir(rel))
                    .unwrap_or(false)
            }),
        }
    }
}

impl EventSource for NotifySource {
    fn subscribe(
        &self,
        root: &Path,
        kind: SessionKind,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> Result<Subscription> {
        // Filled in by the setup task; dropping the subscription drops the
        // watcher once setup has let go of its handle too.
        let slot: Arc<Mutex<Option<RecommendedWatcher>>> = Arc::new(Mutex::new(None));

        let held = Arc::clone(&slot);
        let fs = Arc::clone(&self.fs);
        let prune = Arc::clone(&self.prune);
        let root = root.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let watcher = match start_watcher(&fs, &prune, &root, kind, events.clone()) {
                Ok(w) => w,
                Err(err) => {
                    // Dropping `events` closes the channel, which ends the session.
                    warn!(root = ?root, error = %err, "cannot watch root");
                    return;
                }
            };
            *held.lock().unwrap_or_else(PoisonError::into_inner) = Some(watcher);
            drop(held);

            for path in initial_scan(fs.as_ref(), &root, prune.as_ref()) {
                if events.send(WatchEvent::Added(path)).is_err() {
                    debug!(root = ?root, "session gone during initial scan");
                    return;
                }
            }
            let _ = events.send(WatchEvent::Ready);
        });

        Ok(Subscription::new(slot))
    }
}

fn start_watcher(
    fs: &Arc<dyn FileSystem>,
    prune: &PruneFn,
    root: &Path,
    kind: SessionKind,
    events: mpsc::UnboundedSender<WatchEvent>,
) -> Result<RecommendedWatcher> {
    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        {
            let fs = Arc::clone(fs);
            let prune = Arc::clone(prune);
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for translated in translate(fs.as_ref(), event, prune.as_ref()) {
                        if events.send(translated).is_err() {
                            // Session already gone; nothing left to notify.
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                }
            }
        },
        Config::default().with_follow_symlinks(false),
    )
    .map_err(|e| SyncError::Other(e.into()))?;

    let mode = match kind {
        SessionKind::Dir => RecursiveMode::Recursive,
        SessionKind::File => RecursiveMode::NonRecursive,
    };
    watcher
        .watch(root, mode)
        .map_err(|e| SyncError::ConfigError(format!("cannot watch {:?}: {e}", root)))?;

    info!("file watcher started on {:?}", root);
    Ok(watcher)
}

/// Every file at or below `root`, found with an explicit work stack.
///
/// Symlinked directories and directories for which `prune` returns true are
/// not descended into.
pub fn initial_scan(
    fs: &dyn FileSystem,
    root: &Path,
    prune: &dyn Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    if fs.is_file(root) {
        return vec![root.to_path_buf()];
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = ?dir, error = %err, "cannot list directory during scan");
                continue;
            }
        };
        for path in entries {
            if fs.is_dir(&path) {
                if fs.is_symlink(&path) {
                    debug!(dir = ?path, "not following symlinked directory");
                } else if prune(&path) {
                    debug!(dir = ?path, "excluded directory not scanned");
                } else {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Map one `notify` event onto zero or more [`WatchEvent`]s.
pub fn translate(
    fs: &dyn FileSystem,
    event: Event,
    prune: &dyn Fn(&Path) -> bool,
) -> Vec<WatchEvent> {
    debug!(?event, "received notify event");

    match event.kind {
        // Empty directories appear on the target side with the skeleton or
        // when their first file is written.
        EventKind::Create(_) => event
            .paths
            .into_iter()
            .flat_map(|p| appeared(fs, p, prune))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            let mut paths = event.paths.into_iter();
            let mut out = Vec::new();
            if let Some(from) = paths.next() {
                out.push(WatchEvent::Removed(from));
            }
            if let Some(to) = paths.next() {
                out.extend(appeared(fs, to, prune));
            }
            out
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(WatchEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .into_iter()
            .flat_map(|p| {
                if fs.exists(&p) {
                    appeared(fs, p, prune)
                } else {
                    vec![WatchEvent::Removed(p)]
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => event
            .paths
            .into_iter()
            .filter_map(|p| {
                if fs.is_file(&p) {
                    Some(WatchEvent::Changed(p))
                } else if !fs.exists(&p) {
                    Some(WatchEvent::Removed(p))
                } else {
                    None
                }
            })
            .collect(),
        EventKind::Remove(RemoveKind::Folder) => {
            event.paths.into_iter().map(WatchEvent::DirRemoved).collect()
        }
        EventKind::Remove(_) => event.paths.into_iter().map(WatchEvent::Removed).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Events for a path that just appeared: the file itself, or every file of a
/// directory that was moved in.
fn appeared(fs: &dyn FileSystem, path: PathBuf, prune: &dyn Fn(&Path) -> bool) -> Vec<WatchEvent> {
    if fs.is_dir(&path) {
        if fs.is_symlink(&path) || prune(&path) {
            return Vec::new();
        }
        initial_scan(fs, &path, prune)
            .into_iter()
            .map(WatchEvent::Added)
            .collect()
    } else if fs.is_file(&path) {
        vec![WatchEvent::Added(path)]
    } else {
        Vec::new()
    }
}
