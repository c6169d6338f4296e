// src/engine/mod.rs

//! Event-driven mirroring engine.
//!
//! This module ties together:
//! - the per-session state machine ([`dispatcher`]) that turns
//!   [`WatchEvent`]s into [`MirrorAction`]s without touching the filesystem
//! - the IO shell ([`executor`]) that performs those actions
//! - the async session loop ([`session`]) that feeds one into the other until
//!   the session is stopped

use std::path::PathBuf;

use tracing::warn;

use crate::errors::Result;
use crate::types::FileCategory;

/// Filesystem change reported by an event source.
///
/// An event source reports its initial scan as `Added` events followed by one
/// `Ready`. For a given path, add/change events are delivered before a later
/// removal of that path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    DirRemoved(PathBuf),
    /// The initial scan is complete.
    Ready,
}

/// Work the executor should perform for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    /// Convert `source`, run the rule pipeline and write the result.
    Render {
        source: PathBuf,
        target: PathBuf,
        category: FileCategory,
    },
    /// Copy `source` byte-for-byte.
    Copy { source: PathBuf, target: PathBuf },
    /// Delete the mirrored file of a removed source file.
    RemoveFile { source: PathBuf, target: PathBuf },
    /// Delete the mirrored subtree of a removed source directory.
    RemoveTree { source: PathBuf, target: PathBuf },
    /// Create the target directory skeleton for `root`.
    BuildSkeleton { root: PathBuf },
    /// Signal that the initial sync of the session is done.
    InitialSyncComplete,
}

/// What an executed action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Written(PathBuf),
    /// Target already had identical content; nothing was written.
    Unchanged(PathBuf),
    Removed { target: PathBuf, entries: usize },
    /// Removal of a target that did not exist.
    Absent(PathBuf),
    SkeletonBuilt { created: usize },
    InitialSyncComplete,
}

/// Counters for one session, returned when it closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
    /// Filtered or out-of-root events that produced no action.
    pub skipped: usize,
    pub failed: usize,
    pub directories_created: usize,
    pub initial_sync_complete: bool,
}

impl SyncReport {
    pub fn record(&mut self, result: &Result<ActionOutcome>) {
        match result {
            Ok(ActionOutcome::Written(_)) => self.written += 1,
            Ok(ActionOutcome::Unchanged(_)) => self.unchanged += 1,
            Ok(ActionOutcome::Removed { .. }) => self.removed += 1,
            Ok(ActionOutcome::Absent(_)) => {}
            Ok(ActionOutcome::SkeletonBuilt { created }) => self.directories_created += created,
            Ok(ActionOutcome::InitialSyncComplete) => self.initial_sync_complete = true,
            Err(err) => {
                warn!(error = %err, "mirror action failed");
                self.failed += 1;
            }
        }
    }
}

pub mod dispatcher;
pub mod executor;
pub mod session;

pub use dispatcher::{DispatchStep, Dispatcher};
pub use executor::ActionExecutor;
pub use session::{run_session, SessionChannels};
