//! Live Vault log monitoring
//!
//! - `tail_reader`: incremental, cancellable reading of the log file
//! - `classifier`: log line → error key
//! - `notification_hub`: fan-out to WebSocket observers
//! - `processor`: the monitor loop wiring the pieces together

pub mod classifier;
pub mod notification_hub;
pub mod processor;
pub mod tail_reader;

pub use classifier::{Classifier, VAULT_ERROR_VOCABULARY};
pub use notification_hub::{NotificationHub, Subscriber};
pub use processor::{Monitor, MonitorHandle};
pub use tail_reader::{read_last_lines, LogLine, ReplaceSignal, TailReader, TailState};
