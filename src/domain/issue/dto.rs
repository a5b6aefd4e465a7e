use crate::resolution::{Resolution, ResolutionEntry};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Default number of lines returned by the log viewer
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Upper bound on lines returned in one request
pub const MAX_LOG_LIMIT: usize = 10_000;

/// 로그 조회 쿼리
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// 반환할 최근 줄 수 (기본 100)
    pub limit: Option<usize>,
}

impl LogsQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT)
    }
}

/// 로그 업로드 결과
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[schema(example = 2048)]
    pub bytes_written: usize,
}

/// 에러 검색 요청 DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    /// Error text to resolve, e.g. "vault is sealed"
    #[validate(length(min = 1, max = 1000, message = "error must be 1 to 1000 characters"))]
    #[schema(example = "vault is sealed")]
    pub error: String,
}

/// 에러 검색 결과
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResult {
    /// Canonical error key
    #[schema(example = "vault is sealed")]
    pub error: String,
    /// Text or list of steps
    #[schema(value_type = Object)]
    pub resolution: Resolution,
    /// Set when the oracle could not produce a resolution
    #[schema(example = false)]
    pub unavailable: bool,
}

/// 저장된 해결책
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolutionItem {
    #[schema(example = "vault is sealed")]
    pub error: String,
    #[schema(value_type = Object)]
    pub resolution: Resolution,
}

impl From<ResolutionEntry> for ResolutionItem {
    fn from(entry: ResolutionEntry) -> Self {
        Self {
            error: entry.error,
            resolution: entry.resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_and_cap_log_limit() {
        assert_eq!(LogsQuery { limit: None }.limit(), DEFAULT_LOG_LIMIT);
        assert_eq!(LogsQuery { limit: Some(5) }.limit(), 5);
        assert_eq!(LogsQuery { limit: Some(usize::MAX) }.limit(), MAX_LOG_LIMIT);
    }

    #[test]
    fn should_reject_empty_search_error() {
        let req = SearchRequest {
            error: String::new(),
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn should_serialize_step_resolution_as_array() {
        let result = SearchResult {
            error: "vault is sealed".into(),
            resolution: Resolution::Steps(vec!["vault status".into()]),
            unavailable: false,
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["resolution"][0], "vault status");
    }
}
