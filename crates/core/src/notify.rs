//! Bounded background queue for address-change notifications.
//!
//! Refresh must never block on, or fail because of, the notifier. The
//! engine enqueues an [`AddressChange`] without awaiting; a single worker
//! task drains the queue and delivers each event with its own timeout.
//! Cancellation of the originating request cannot reach the worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::ChangeNotifier;
use crate::types::UserId;

/// An observed change of a session's originating network address.
#[derive(Debug, Clone)]
pub struct AddressChange {
    pub owner_id: UserId,
    pub old_address: String,
    pub new_address: String,
}

/// Cheap cloneable producer side of the notification queue.
#[derive(Clone)]
pub struct NotifyHandle {
    tx: mpsc::Sender<AddressChange>,
}

impl NotifyHandle {
    /// Enqueue without blocking. If the queue is full the event is dropped;
    /// delivery is best-effort and losing an alert must not affect the
    /// refresh that produced it.
    pub fn enqueue(&self, change: AddressChange) {
        if let Err(e) = self.tx.try_send(change) {
            tracing::warn!(error = %e, "notification queue full, dropping address-change alert");
        }
    }
}

/// Spawn the delivery worker.
///
/// Returns the producer handle and the worker's join handle. The worker
/// exits once every [`NotifyHandle`] clone has been dropped and the queue
/// is drained.
pub fn spawn_notify_worker(
    notifier: Arc<dyn ChangeNotifier>,
    capacity: usize,
    delivery_timeout: Duration,
) -> (NotifyHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<AddressChange>(capacity);

    let worker = tokio::spawn(async move {
        while let Some(change) = rx.recv().await {
            let delivery = notifier.notify(
                change.owner_id,
                &change.old_address,
                &change.new_address,
            );
            if tokio::time::timeout(delivery_timeout, delivery).await.is_err() {
                tracing::warn!(
                    owner_id = %change.owner_id,
                    "address-change notification timed out"
                );
            }
        }
        tracing::debug!("notification worker shutting down");
    });

    (NotifyHandle { tx }, worker)
}
