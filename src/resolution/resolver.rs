//! Resolution resolver: store first, oracle on miss
//!
//! - A cache hit never queries the oracle again
//! - A successful oracle answer is persisted before it is returned
//! - An oracle failure or timeout yields the "unavailable" sentinel, which is
//!   never persisted so the next occurrence retries the oracle
//! - The address placeholder is substituted on every call, hits included

use crate::domain::ai::Oracle;
use crate::resolution::model::{ErrorKey, Resolution, ResolutionEntry};
use crate::resolution::store::ResolutionStore;
use crate::utils::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

pub struct ResolutionResolver {
    store: Arc<ResolutionStore>,
    oracle: Oracle,
    /// Address substituted for the placeholder; may be discovered after startup
    address: RwLock<Option<String>>,
    oracle_timeout: Duration,
}

impl ResolutionResolver {
    pub fn new(store: Arc<ResolutionStore>, oracle: Oracle, oracle_timeout: Duration) -> Self {
        Self {
            store,
            oracle,
            address: RwLock::new(None),
            oracle_timeout,
        }
    }

    /// Set the initial service address
    pub fn with_address(mut self, address: Option<String>) -> Self {
        self.address = RwLock::new(address);
        self
    }

    /// Update the service address used for placeholder substitution
    pub async fn set_address(&self, address: impl Into<String>) {
        let address = address.into();
        info!(address = %address, "Service address updated");
        *self.address.write().await = Some(address);
    }

    pub async fn address(&self) -> Option<String> {
        self.address.read().await.clone()
    }

    pub fn store(&self) -> &Arc<ResolutionStore> {
        &self.store
    }

    /// Resolve arbitrary text; blank input yields the sentinel
    pub async fn resolve_raw(&self, raw: &str) -> Resolution {
        match ErrorKey::new(raw) {
            Some(key) => self.resolve(&key).await,
            None => {
                warn!("Blank error key submitted, nothing to resolve");
                Resolution::unavailable()
            }
        }
    }

    /// Resolve `key` to a remediation. Never fails.
    #[instrument(skip(self), fields(error_key = %key))]
    pub async fn resolve(&self, key: &ErrorKey) -> Resolution {
        if let Some(cached) = self.store.find(key) {
            debug!("Resolution cache hit");
            return self.substitute(cached).await;
        }

        info!("Resolution cache miss, asking oracle");

        let resolution = match self.query_oracle(key).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Oracle failed, returning unavailable resolution");
                return Resolution::unavailable();
            }
        };

        if let Err(e) = self.store.upsert(key, resolution.clone()).await {
            error!(error = %e, "Failed to persist oracle resolution");
        }

        self.substitute(resolution).await
    }

    /// Every persisted entry with the placeholder substituted
    pub async fn resolutions(&self) -> Vec<ResolutionEntry> {
        let address = self.address().await;
        self.store
            .load()
            .into_iter()
            .map(|entry| ResolutionEntry {
                resolution: match &address {
                    Some(addr) => entry.resolution.with_address(addr),
                    None => entry.resolution,
                },
                error: entry.error,
            })
            .collect()
    }

    async fn query_oracle(&self, key: &ErrorKey) -> Result<Resolution, AppError> {
        let resolution = tokio::time::timeout(self.oracle_timeout, self.oracle.query(key.as_str()))
            .await
            .map_err(|_| AppError::OracleTimeout(self.oracle_timeout.as_secs()))??;

        if resolution.is_empty() || resolution.is_unavailable() {
            return Err(AppError::OracleError(
                "Oracle returned no usable resolution".to_string(),
            ));
        }
        Ok(resolution)
    }

    async fn substitute(&self, resolution: Resolution) -> Resolution {
        match self.address.read().await.as_deref() {
            Some(addr) => resolution.with_address(addr),
            None => resolution,
        }
    }
}
