use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use tracing::{debug, info};

use super::prompt::{build_resolution_prompt, RESOLUTION_SYSTEM_PROMPT};
use super::retry::with_retry;
use crate::resolution::Resolution;
use crate::utils::AppError;

/// OpenAI 단일 호출 타임아웃 (초)
const OPENAI_REQUEST_TIMEOUT_SECS: u64 = 25;

/// OpenAI 에러를 세분화된 AppError로 변환
fn classify_openai_error(error: OpenAIError) -> AppError {
    match &error {
        OpenAIError::ApiError(api_err) => {
            let err_type = api_err.r#type.as_deref().unwrap_or("");
            let message = &api_err.message;

            if message.contains("API key") || err_type == "authentication_error" {
                AppError::OracleAuthError
            } else if err_type == "rate_limit_error"
                || err_type == "insufficient_quota"
                || message.contains("rate limit")
                || message.contains("Rate limit")
            {
                AppError::OracleRateLimitError
            } else if err_type == "server_error" || message.contains("server") {
                AppError::OracleTemporaryError
            } else {
                AppError::OracleError(message.clone())
            }
        }
        OpenAIError::Reqwest(req_err) => {
            let status = req_err.status().map(|s| s.as_u16());
            if req_err.is_timeout() || req_err.is_connect() {
                AppError::OracleTemporaryError
            } else if status == Some(401) {
                AppError::OracleAuthError
            } else if status == Some(429) {
                AppError::OracleRateLimitError
            } else if status.map(|s| s >= 500).unwrap_or(false) {
                AppError::OracleTemporaryError
            } else {
                AppError::OracleError(req_err.to_string())
            }
        }
        _ => AppError::OracleError(error.to_string()),
    }
}

/// Turn an oracle answer into a resolution.
///
/// `STEP n: ...` lines become a step list; any other non-empty answer is kept
/// as free text. An empty answer is an oracle failure.
pub fn parse_resolution(content: &str) -> Result<Resolution, AppError> {
    static STEP_LINE: OnceLock<Regex> = OnceLock::new();
    let step_line = STEP_LINE.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:\*\*)?step\s+\d+\s*(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.+?)\s*$")
            .expect("step pattern is valid")
    });

    let steps: Vec<String> = step_line
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if !steps.is_empty() {
        return Ok(Resolution::Steps(steps));
    }

    let text = content.trim();
    if text.is_empty() {
        return Err(AppError::OracleError("Oracle returned an empty answer".to_string()));
    }
    Ok(Resolution::Text(text.to_string()))
}

/// 해결책 오라클 인터페이스
///
/// 외부 지식 소스 호출을 추상화하여 테스트에서 Mock 객체로 대체할 수 있습니다.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ResolutionOracle: Send + Sync {
    /// Ask for a remediation of `error_key`
    async fn query(&self, error_key: &str) -> Result<Resolution, AppError>;
}

/// Arc로 래핑된 오라클 (Clone 지원)
pub type Oracle = Arc<dyn ResolutionOracle>;

/// OpenAI chat completion backed oracle
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client<OpenAIConfig>,
    model: String,
    enabled: bool,
}

impl OpenAiOracle {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.into(),
            enabled: !api_key.trim().is_empty(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn complete(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .temperature(0.5)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let response = tokio::time::timeout(
            Duration::from_secs(OPENAI_REQUEST_TIMEOUT_SECS),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| AppError::OracleTemporaryError)?
        .map_err(classify_openai_error)?;

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ResolutionOracle for OpenAiOracle {
    async fn query(&self, error_key: &str) -> Result<Resolution, AppError> {
        if !self.enabled {
            debug!(error_key = %error_key, "Oracle disabled, no API key configured");
            return Err(AppError::OracleAuthError);
        }

        info!(error_key = %error_key, model = %self.model, "Querying oracle for resolution");

        let prompt = build_resolution_prompt(error_key);
        let prompt = prompt.as_str();
        let content = with_retry(move || async move {
            let messages = vec![
                build_system_message(RESOLUTION_SYSTEM_PROMPT)?,
                build_user_message(prompt)?,
            ];
            self.complete(messages).await
        })
        .await?;

        parse_resolution(&content)
    }
}

/// 메시지 빌더 헬퍼 함수 (crate 내부용)
pub(crate) fn build_system_message(content: &str) -> Result<ChatCompletionRequestMessage, AppError> {
    Ok(ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?,
    ))
}

pub(crate) fn build_user_message(content: &str) -> Result<ChatCompletionRequestMessage, AppError> {
    Ok(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?,
    ))
}
