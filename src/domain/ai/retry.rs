use backoff::{future::retry, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;

use crate::utils::AppError;

/// 재시도 가능한 에러인지 판단
///
/// Rate limit, timeout, 서버 에러(5xx) 등 일시적 오류는 재시도
/// 인증 오류, 요청 형식 오류 등 영구적 오류는 즉시 실패
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::OracleRateLimitError | AppError::OracleTemporaryError => true,
        AppError::OracleError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("rate limit")
                || msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("429")
                || msg_lower.contains("500")
                || msg_lower.contains("502")
                || msg_lower.contains("503")
                || msg_lower.contains("504")
                || msg_lower.contains("server error")
                || msg_lower.contains("connection")
                || msg_lower.contains("network")
        }
        _ => false,
    }
}

/// 지수 백오프 설정 생성
///
/// The resolver's own timeout bounds the whole sequence as well.
fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(5),
        max_elapsed_time: Some(Duration::from_secs(20)),
        multiplier: 2.0,
        ..Default::default()
    }
}

/// 재시도 로직을 적용한 비동기 작업 실행
///
/// 일시적 오류 시 지수 백오프로 재시도하고,
/// 영구적 오류 시 즉시 실패를 반환합니다.
pub async fn with_retry<F, Fut, T>(operation: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let operation = &operation;
    retry(create_backoff(), move || async move {
        operation().await.map_err(|e| {
            if is_retryable_error(&e) {
                tracing::warn!(error = %e, "Retryable oracle error, will retry");
                backoff::Error::transient(e)
            } else {
                tracing::error!(error = %e, "Permanent oracle error, not retrying");
                backoff::Error::permanent(e)
            }
        })
    })
    .await
}
