// src/watch/source.rs

use std::fmt::{self, Debug};
use std::path::Path;

use tokio::sync::mpsc;

use crate::engine::WatchEvent;
use crate::errors::Result;
use crate::types::SessionKind;

/// Producer of filesystem change events for one root.
///
/// After `subscribe` returns, the source must:
/// 1. report every existing file under `root` as `WatchEvent::Added`,
/// 2. send exactly one `WatchEvent::Ready`,
/// 3. forward live changes until the returned [`Subscription`] is dropped.
///
/// Events for one path have to stay in the order they happened.
pub trait EventSource: Send + Sync + Debug {
    fn subscribe(
        &self,
        root: &Path,
        kind: SessionKind,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> Result<Subscription>;
}

/// Handle for an active subscription.
///
/// This exists mainly so the underlying watcher is kept alive for as long as
/// needed. Dropping it stops event delivery.
pub struct Subscription {
    _guard: Box<dyn Send>,
}

impl Subscription {
    pub fn new(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}
