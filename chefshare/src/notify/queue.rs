//! Fire-and-forget delivery queue.

use super::{Notification, Notifier};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for submitting notifications to the background worker.
///
/// Cloning is cheap. The worker exits once every handle has been dropped
/// and the backlog is drained.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Spawn the delivery worker on the current runtime.
    pub fn start(notifier: Arc<dyn Notifier>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Notification>();

        let worker = tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                match notification.deliver(notifier.as_ref()).await {
                    Ok(id) => log::info!(
                        "Sent {} email to {} (id: {})",
                        notification.kind(),
                        notification.recipient(),
                        id
                    ),
                    Err(e) => log::error!(
                        "Failed to send {} email to {}: {}",
                        notification.kind(),
                        notification.recipient(),
                        e
                    ),
                }
            }
            log::debug!("Notification worker stopped");
        });

        (Self { sender }, worker)
    }

    /// Queue a notification. Never blocks and never fails the caller.
    pub fn submit(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            log::error!(
                "Notification worker gone, dropping {} email to {}",
                e.0.kind(),
                e.0.recipient()
            );
        }
    }
}
