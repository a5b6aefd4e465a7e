use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::response::ErrorResponse;

/// 애플리케이션 전역 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    InternalError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("잘못된 요청 형식입니다: {0}")]
    JsonParseFailed(String),
    #[error("Log file not found: {0}")]
    LogFileNotFound(String),
    #[error("Oracle error: {0}")]
    OracleError(String),
    #[error("Oracle rate limit exceeded")]
    OracleRateLimitError,
    #[error("Oracle rejected the API credentials")]
    OracleAuthError,
    #[error("Oracle is temporarily unavailable")]
    OracleTemporaryError,
    #[error("Oracle did not answer within {0} seconds")]
    OracleTimeout(u64),
}

impl AppError {
    /// 에러 메시지 반환
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// 에러 코드 반환
    pub fn error_code(&self) -> String {
        match self {
            AppError::BadRequest(_) => "COMMON400",
            AppError::InternalError(_) => "COMMON500",
            AppError::ValidationError(_) => "COMMON400",
            AppError::JsonParseFailed(_) => "COMMON400",
            AppError::LogFileNotFound(_) => "LOG404",
            AppError::OracleError(_) => "ORACLE500",
            AppError::OracleRateLimitError => "ORACLE429",
            AppError::OracleAuthError => "ORACLE401",
            AppError::OracleTemporaryError => "ORACLE503",
            AppError::OracleTimeout(_) => "ORACLE504",
        }
        .to_string()
    }

    /// HTTP 상태 코드 반환
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::JsonParseFailed(_) => StatusCode::BAD_REQUEST,
            AppError::LogFileNotFound(_) => StatusCode::NOT_FOUND,
            AppError::OracleError(_) => StatusCode::BAD_GATEWAY,
            AppError::OracleRateLimitError => StatusCode::TOO_MANY_REQUESTS,
            AppError::OracleAuthError => StatusCode::BAD_GATEWAY,
            AppError::OracleTemporaryError => StatusCode::SERVICE_UNAVAILABLE,
            AppError::OracleTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.message();

        // 에러 로깅
        match &self {
            AppError::InternalError(_) => {
                error!("Internal Server Error: {}", message);
            }
            _ => {
                error!("Error [{}]: {}", error_code, message);
            }
        }

        let error_response = ErrorResponse::new(error_code, message);

        (status, Json(error_response)).into_response()
    }
}

/// JsonRejection을 AppError로 변환
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::JsonParseFailed(rejection.to_string())
    }
}

/// 편의 함수들
impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AppError::InternalError(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_log_file_not_found_to_404() {
        let error = AppError::LogFileNotFound("vault.log".to_string());

        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.error_code(), "LOG404");
        assert!(error.message().contains("vault.log"));
    }

    #[test]
    fn should_map_oracle_timeout_to_gateway_timeout() {
        let error = AppError::OracleTimeout(20);

        assert_eq!(error.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error.error_code(), "ORACLE504");
    }

    #[test]
    fn should_map_validation_error_to_bad_request() {
        let error = AppError::validation_error("error must not be empty");

        assert_eq!(error.error_code(), "COMMON400");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
