use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default poll interval of the tail reader (milliseconds)
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default bound on a single oracle resolution (seconds)
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,

    // Monitoring
    pub log_file: PathBuf,
    pub poll_interval_ms: u64,

    // Resolution cache
    pub store_path: PathBuf,

    // Oracle (OpenAI)
    pub openai_api_key: String,
    pub openai_model: String,
    pub oracle_timeout_secs: u64,

    /// Vault address substituted for the `<ADDR>` placeholder
    pub vault_addr: Option<String>,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_file = PathBuf::from(env::var("LOG_FILE").unwrap_or_else(|_| "vault.log".into()));

        let poll_interval_ms = parse_u64("TAIL_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::InvalidNumber("TAIL_POLL_INTERVAL_MS"));
        }

        let store_path = PathBuf::from(
            env::var("RESOLUTION_STORE_PATH").unwrap_or_else(|_| "knowledge_base.json".into()),
        );

        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!(
                "OPENAI_API_KEY 환경변수가 설정되지 않았습니다. 캐시에 없는 에러는 해결책을 찾을 수 없습니다."
            );
            String::new()
        });

        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

        let oracle_timeout_secs = parse_u64("ORACLE_TIMEOUT_SECS", DEFAULT_ORACLE_TIMEOUT_SECS)?;

        let vault_addr = env::var("VAULT_ADDR")
            .ok()
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty());

        Ok(Self {
            server_port,
            log_file,
            poll_interval_ms,
            store_path,
            openai_api_key,
            openai_model,
            oracle_timeout_secs,
            vault_addr,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

fn parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid numeric value for {0}")]
    InvalidNumber(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_intervals_to_durations() {
        // Arrange
        let config = AppConfig {
            server_port: 8000,
            log_file: PathBuf::from("vault.log"),
            poll_interval_ms: 250,
            store_path: PathBuf::from("knowledge_base.json"),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            oracle_timeout_secs: 12,
            vault_addr: None,
        };

        // Act & Assert
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.oracle_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn should_fall_back_to_default_for_unset_variable() {
        let value = parse_u64("VAULT_SENTINEL_TEST_UNSET_VARIABLE", 42).expect("parse failed");

        assert_eq!(value, 42);
    }

    #[test]
    fn should_name_variable_in_invalid_number_error() {
        let error = ConfigError::InvalidNumber("ORACLE_TIMEOUT_SECS");

        assert_eq!(
            error.to_string(),
            "Invalid numeric value for ORACLE_TIMEOUT_SECS"
        );
    }
}
