use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use docmirror::engine::WatchEvent;
use docmirror::errors::Result;
use docmirror::types::SessionKind;
use docmirror::watch::{EventSource, Subscription};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Subscriber {
    root: PathBuf,
    events: mpsc::UnboundedSender<WatchEvent>,
    released: Arc<AtomicBool>,
}

/// Event source driven by the test.
///
/// Nothing is emitted on subscribe; tests push the initial scan, `Ready` and
/// any later change with [`ManualEventSource::send`].
#[derive(Debug, Clone, Default)]
pub struct ManualEventSource {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

/// Flips its flag when the subscription holding it is dropped.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ManualEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to the most recent subscriber. Returns false if there is none or
    /// its session is gone.
    pub fn send(&self, event: WatchEvent) -> bool {
        let subs = self.subscribers.lock().unwrap();
        match subs.last() {
            Some(sub) => sub.events.send(event).is_ok(),
            None => false,
        }
    }

    /// Send to the subscriber watching `root`.
    pub fn send_to(&self, root: &Path, event: WatchEvent) -> bool {
        let subs = self.subscribers.lock().unwrap();
        subs.iter()
            .rev()
            .find(|s| s.root == root)
            .map(|s| s.events.send(event).is_ok())
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Whether the subscription for `root` has been dropped by its session.
    pub fn is_released(&self, root: &Path) -> bool {
        let subs = self.subscribers.lock().unwrap();
        subs.iter()
            .rev()
            .find(|s| s.root == root)
            .map(|s| s.released.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

impl EventSource for ManualEventSource {
    fn subscribe(
        &self,
        root: &Path,
        _kind: SessionKind,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> Result<Subscription> {
        let released = Arc::new(AtomicBool::new(false));
        self.subscribers.lock().unwrap().push(Subscriber {
            root: root.to_path_buf(),
            events,
            released: Arc::clone(&released),
        });
        Ok(Subscription::new(ReleaseFlag(released)))
    }
}
