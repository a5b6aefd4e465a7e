use serde::Serialize;
use utoipa::ToSchema;

/// 센티넬 상태 응답
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// healthy / degraded / unhealthy
    pub status: HealthState,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// 가동 시간 (초)
    #[schema(example = 3600)]
    pub uptime_secs: u64,
    /// Live WebSocket observers
    #[schema(example = 2)]
    pub subscribers: usize,
    pub checks: HealthChecks,
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    /// Monitoring works but new errors cannot be resolved
    Degraded,
    /// Monitored log file is missing
    Unhealthy,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub log_file: CheckResult,
    pub oracle: CheckResult,
    pub resolution_store: CheckResult,
}

/// 개별 체크 결과
#[derive(Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    #[schema(example = true)]
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "vault.log")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: true,
            detail: Some(detail.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: false,
            detail: None,
            error: Some(error.into()),
        }
    }
}
