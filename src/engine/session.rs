// src/engine/session.rs

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::errors::SyncError;
use crate::types::{SessionId, SessionState};
use crate::watch::Subscription;

use super::{ActionExecutor, ActionOutcome, Dispatcher, MirrorAction, SyncReport, WatchEvent};

/// Channels and handles owned by one running session.
pub struct SessionChannels {
    pub events: mpsc::UnboundedReceiver<WatchEvent>,
    /// Fires (or is dropped) when the session should close.
    pub stop: oneshot::Receiver<()>,
    pub state: watch::Sender<SessionState>,
    /// Keeps the notifier subscription alive until the session closes.
    pub subscription: Subscription,
}

/// Drive one session until it is stopped or its event source goes away.
///
/// - Consumes `WatchEvent`s in arrival order.
/// - Feeds them into the dispatcher.
/// - Runs the resulting actions on the blocking pool, one at a time, so an
///   action that has started always completes even if a stop arrives.
///
/// With `once` set the session closes itself right after its initial sync.
pub async fn run_session(
    id: SessionId,
    mut dispatcher: Dispatcher,
    executor: ActionExecutor,
    channels: SessionChannels,
    once: bool,
) -> SyncReport {
    let SessionChannels {
        mut events,
        mut stop,
        state,
        subscription,
    } = channels;

    info!(session = %id, root = ?dispatcher.root(), "watch session started");
    let mut report = SyncReport::default();

    loop {
        let event = tokio::select! {
            biased;
            _ = &mut stop => {
                info!(session = %id, "stop requested");
                break;
            }
            event = events.recv() => match event {
                Some(e) => e,
                None => {
                    info!(session = %id, "event source closed");
                    break;
                }
            },
        };

        debug!(session = %id, ?event, "session received event");
        let step = dispatcher.step(event);
        if step.skipped {
            report.skipped += 1;
        }
        if step.became_active {
            state.send_replace(SessionState::Active);
        }

        for action in step.actions {
            let result = execute_blocking(&executor, action).await;
            report.record(&result);
        }

        if once && report.initial_sync_complete {
            info!(session = %id, "one-shot sync finished");
            break;
        }
    }

    dispatcher.close();
    drop(subscription);
    state.send_replace(SessionState::Closed);
    info!(session = %id, ?report, "watch session closed");
    report
}

async fn execute_blocking(
    executor: &ActionExecutor,
    action: MirrorAction,
) -> crate::errors::Result<ActionOutcome> {
    let executor = executor.clone();
    tokio::task::spawn_blocking(move || executor.execute(&action))
        .await
        .unwrap_or_else(|join_err| {
            Err(SyncError::Other(anyhow::anyhow!(
                "mirror action panicked: {join_err}"
            )))
        })
}
