//! Fan-out of resolution notifications to live observers
//!
//! Each subscriber owns the receiving end of a bounded channel. A broadcast
//! checks the outcome of every send without waiting on any observer: a full
//! buffer drops that message for that observer only, and a closed observer is
//! pruned. Broadcasts are serialized, so each observer receives messages in
//! call order.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-subscriber channel capacity
const SUBSCRIBER_BUFFER: usize = 64;

/// A registered observer
pub struct Subscriber {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<String>,
}

#[derive(Default)]
pub struct NotificationHub {
    subscribers: Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>,
    /// Held for the whole broadcast so per-subscriber order follows call order
    broadcast_lock: Mutex<()>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self) -> Subscriber {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();

        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, sender);
            subscribers.len()
        };

        info!(subscriber_id = %id, subscribers = count, "Subscriber connected");
        Subscriber { id, receiver }
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        let removed = self.subscribers.write().await.remove(&id).is_some();
        if removed {
            info!(subscriber_id = %id, "Subscriber disconnected");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deliver `message` to every subscriber.
    ///
    /// Failures are logged per subscriber and never surfaced. Returns the
    /// number of subscribers that received the message.
    pub async fn broadcast(&self, message: &str) -> usize {
        let _guard = self.broadcast_lock.lock().await;

        // Snapshot so connects and disconnects are not blocked by delivery
        let targets: Vec<(Uuid, mpsc::Sender<String>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, sender) in targets {
            match sender.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber_id = %id, "Subscriber buffer full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(subscriber_id = %id, "Subscriber channel closed, pruning");
                    closed.push(id);
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &closed {
                subscribers.remove(id);
            }
        }

        debug!(delivered, pruned = closed.len(), "Broadcast finished");
        delivered
    }
}
