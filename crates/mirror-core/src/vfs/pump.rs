//! Debounced delivery of watcher events into the table

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use super::{VirtualFileTable, WatcherEvent};

/// Drain `events` into `table` in debounced batches.
///
/// After the first event of a burst, further events are collected until
/// `window` has elapsed, then the whole batch is applied in arrival order
/// under a single write lock. Anything still buffered when the channel
/// closes is flushed before the task ends.
pub fn spawn_event_pump(
    table: Arc<RwLock<VirtualFileTable>>,
    mut events: mpsc::Receiver<WatcherEvent>,
    window: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(first) = events.recv().await {
            let mut batch = vec![first];
            let deadline = Instant::now() + window;
            let mut closed = false;

            loop {
                tokio::select! {
                    next = events.recv() => match next {
                        Some(event) => batch.push(event),
                        None => {
                            closed = true;
                            break;
                        }
                    },
                    _ = sleep_until(deadline) => break,
                }
            }

            let received = batch.len();
            let applied = table.write().await.apply_events(batch);
            tracing::debug!(received, applied, "applied watcher batch");

            if closed {
                break;
            }
        }
        tracing::debug!("watcher channel closed, event pump stopping");
    })
}
