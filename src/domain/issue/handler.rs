use super::dto::{LogsQuery, ResolutionItem, SearchRequest, SearchResult, UploadResult};
use crate::monitoring::read_last_lines;
use crate::resolution::ErrorKey;
use crate::state::AppState;
use crate::utils::{error::AppError, response::BaseResponse, response::ErrorResponse};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use tracing::{error, info};
use validator::Validate;

/// 최근 로그 조회 API
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Most recent log lines, oldest first"),
        (status = 404, body = ErrorResponse),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<BaseResponse<Vec<String>>>, AppError> {
    let path = state.config.log_file.clone();
    let limit = query.limit();

    let lines = tokio::task::spawn_blocking(move || read_last_lines(&path, limit))
        .await
        .map_err(|e| AppError::internal_error(format!("Log reader task failed: {}", e)))??;

    Ok(Json(BaseResponse::success(lines)))
}

/// 로그 파일 교체 API
///
/// 요청 본문으로 감시 중인 로그 파일을 덮어쓰고, 테일러가 처음부터 다시 읽도록 표시합니다.
#[utoipa::path(
    put,
    path = "/api/logs",
    tag = "Logs",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, body = UploadResult),
        (status = 500, body = ErrorResponse)
    )
)]
pub async fn upload_logs(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<BaseResponse<UploadResult>>, AppError> {
    let path = state.config.log_file.clone();
    let signal = state.replace_signal.clone();
    let bytes_written = body.len();

    // 교체와 표시는 테일러의 poll과 같은 잠금 아래에서 수행
    tokio::task::spawn_blocking(move || {
        signal.replace_contents(&path, body.as_bytes()).map_err(|e| {
            error!(error = %e, file = %path.display(), "Failed to replace log file");
            AppError::internal_error(format!("Failed to replace log file: {}", e))
        })
    })
    .await
    .map_err(|e| AppError::internal_error(format!("Log upload task failed: {}", e)))??;

    info!(
        file = %state.config.log_file.display(),
        bytes = bytes_written,
        "Log file replaced by upload"
    );

    Ok(Json(BaseResponse::success_with_message(
        UploadResult { bytes_written },
        "Log file replaced",
    )))
}

/// 저장된 해결책 목록 API
#[utoipa::path(
    get,
    path = "/api/resolutions",
    tag = "Resolutions",
    responses(
        (status = 200, body = [ResolutionItem])
    )
)]
pub async fn list_resolutions(
    State(state): State<AppState>,
) -> Json<BaseResponse<Vec<ResolutionItem>>> {
    let items = state
        .resolver()
        .resolutions()
        .await
        .into_iter()
        .map(ResolutionItem::from)
        .collect();

    Json(BaseResponse::success(items))
}

/// 에러 검색 API
///
/// 임의의 에러 문자열에 대한 해결책을 조회하고, 결과를 모든 구독자에게 전송합니다.
#[utoipa::path(
    post,
    path = "/api/search",
    tag = "Resolutions",
    request_body = SearchRequest,
    responses(
        (status = 200, body = SearchResult),
        (status = 400, body = ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<SearchResult>>, AppError> {
    let Json(req) = payload?;

    // 1. 입력값 검증
    req.validate()
        .map_err(|e| AppError::validation_error(e.to_string()))?;
    let key = ErrorKey::new(&req.error)
        .ok_or_else(|| AppError::bad_request("error must not be blank"))?;

    // 2. 해결책 조회 + 브로드캐스트
    let resolution = state.monitor.search(key.as_str()).await;

    Ok(Json(BaseResponse::success(SearchResult {
        error: key.to_string(),
        unavailable: resolution.is_unavailable(),
        resolution,
    })))
}
