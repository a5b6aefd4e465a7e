//! Monitor loop: tail → classify → resolve → broadcast
//!
//! The tail reader and the line processor run as two tasks joined by a
//! bounded channel. A single processor consumes lines in FIFO order, so every
//! subscriber sees notifications in the order the faults were discovered.

use crate::monitoring::classifier::Classifier;
use crate::monitoring::notification_hub::NotificationHub;
use crate::monitoring::tail_reader::{LogLine, ReplaceSignal, TailReader, TailState};
use crate::resolution::{ErrorKey, Resolution, ResolutionResolver};
use chrono::Utc;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Capacity of the tail → processor channel
const LINE_QUEUE_CAPACITY: usize = 256;

pub struct Monitor {
    classifier: Classifier,
    resolver: Arc<ResolutionResolver>,
    hub: Arc<NotificationHub>,
}

impl Monitor {
    pub fn new(
        classifier: Classifier,
        resolver: Arc<ResolutionResolver>,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            classifier,
            resolver,
            hub,
        }
    }

    pub fn resolver(&self) -> &Arc<ResolutionResolver> {
        &self.resolver
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Render a notification for observers
    pub fn format_notification(key: &ErrorKey, resolution: &Resolution) -> String {
        let mut message = format!("Error: {}\nResolution:\n", key);
        match resolution {
            Resolution::Steps(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    let _ = writeln!(message, "STEP {}: {}", i + 1, step);
                }
            }
            Resolution::Text(text) => message.push_str(text),
        }
        message
    }

    /// Classify one tailed line and notify observers on a match.
    /// Returns the number of deliveries, or `None` when the line is not a fault.
    #[instrument(skip(self, line), fields(position = line.position))]
    pub async fn handle_line(&self, line: &LogLine) -> Option<usize> {
        let key = self.classifier.classify(&line.text)?;

        info!(error_key = %key, offset = line.offset, "Vault fault detected");
        Some(self.notify(&key).await)
    }

    /// Resolve an arbitrary error key and broadcast the result, skipping classification
    pub async fn search(&self, raw: &str) -> Resolution {
        let Some(key) = ErrorKey::new(raw) else {
            warn!("Blank search key, nothing to broadcast");
            return Resolution::unavailable();
        };

        let resolution = self.resolver.resolve(&key).await;
        let message = Self::format_notification(&key, &resolution);
        self.hub.broadcast(&message).await;
        resolution
    }

    async fn notify(&self, key: &ErrorKey) -> usize {
        let resolution = self.resolver.resolve(key).await;
        let message = Self::format_notification(key, &resolution);
        let delivered = self.hub.broadcast(&message).await;

        debug!(
            error_key = %key,
            delivered,
            unavailable = resolution.is_unavailable(),
            notified_at = %Utc::now().to_rfc3339(),
            "Notification broadcast"
        );
        delivered
    }

    /// Start tailing `log_file` in the background
    pub fn spawn(self: &Arc<Self>, log_file: impl Into<PathBuf>, poll_interval: Duration) -> MonitorHandle {
        let replace_signal = ReplaceSignal::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (line_tx, mut line_rx) = mpsc::channel::<LogLine>(LINE_QUEUE_CAPACITY);

        let reader = TailReader::new(log_file, poll_interval, replace_signal.clone());
        let tail_task = tokio::spawn(reader.run(line_tx, shutdown_rx));

        let monitor = Arc::clone(self);
        let processing_task = tokio::spawn(async move {
            info!(
                phrases = monitor.classifier.vocabulary().len(),
                "Starting monitor processing loop"
            );
            while let Some(line) = line_rx.recv().await {
                monitor.handle_line(&line).await;
            }
            info!("Monitor processing loop finished");
        });

        MonitorHandle {
            shutdown_tx,
            replace_signal,
            tail_task,
            processing_task,
        }
    }
}

/// Running monitor tasks
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    replace_signal: ReplaceSignal,
    tail_task: JoinHandle<TailState>,
    processing_task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal used to report that the monitored file was replaced
    pub fn replace_signal(&self) -> ReplaceSignal {
        self.replace_signal.clone()
    }

    /// Stop tailing, drain queued lines and wait for both tasks
    pub async fn shutdown(self) -> TailState {
        // Receiver may already be gone when the file was missing at start
        let _ = self.shutdown_tx.send(true);

        let state = match self.tail_task.await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Tail task failed");
                TailState::Stopped
            }
        };

        if let Err(e) = self.processing_task.await {
            error!(error = %e, "Monitor processing task failed");
        }

        info!(final_state = ?state, "Monitor stopped");
        state
    }
}
