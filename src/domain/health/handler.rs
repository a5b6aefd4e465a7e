use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::dto::HealthStatus;
use super::service::check_health;
use crate::state::AppState;

/// Liveness message
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Sentinel is running")
    )
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Vault sentinel is running" }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "OK", body = String)
    )
)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// 상태 점검 API
///
/// 로그 파일, 오라클 설정, 해결책 저장소 상태와 구독자 수를 반환합니다.
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Health",
    responses(
        (status = 200, description = "상태 점검 성공", body = HealthStatus)
    )
)]
pub async fn status_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(check_health(&state).await)
}
