use std::sync::OnceLock;
use std::time::Instant;

use super::dto::{CheckResult, HealthChecks, HealthState, HealthStatus};
use crate::state::AppState;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// 서버 시작 시각 기록 (main에서 한 번 호출)
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

pub async fn check_health(state: &AppState) -> HealthStatus {
    let log_file = if state.config.log_file.exists() {
        CheckResult::success(state.config.log_file.display().to_string())
    } else {
        CheckResult::failure(format!(
            "Log file not found: {}",
            state.config.log_file.display()
        ))
    };

    let oracle = if state.oracle_enabled {
        CheckResult::success(state.config.openai_model.clone())
    } else {
        CheckResult::failure("OPENAI_API_KEY is not configured")
    };

    let entries = state.resolver().store().load().len();
    let resolution_store = CheckResult::success(format!("{} entries", entries));

    let status = match (log_file.status, oracle.status) {
        (false, _) => HealthState::Unhealthy,
        (true, false) => HealthState::Degraded,
        (true, true) => HealthState::Healthy,
    };

    HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime_secs(),
        subscribers: state.hub().subscriber_count().await,
        checks: HealthChecks {
            log_file,
            oracle,
            resolution_store,
        },
    }
}
