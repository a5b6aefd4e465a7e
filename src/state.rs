use crate::config::AppConfig;
use crate::monitoring::{Monitor, NotificationHub, ReplaceSignal};
use crate::resolution::ResolutionResolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub monitor: Arc<Monitor>,
    /// Raised by the upload path so the tail restarts from offset 0
    pub replace_signal: ReplaceSignal,
    pub oracle_enabled: bool,
}

impl AppState {
    pub fn resolver(&self) -> &Arc<ResolutionResolver> {
        self.monitor.resolver()
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        self.monitor.hub()
    }
}
