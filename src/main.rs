use std::net::SocketAddr;
use std::sync::Arc;
use vault_sentinel::config::AppConfig;
use vault_sentinel::domain::ai::OpenAiOracle;
use vault_sentinel::domain::health::init_start_time;
use vault_sentinel::monitoring::{Classifier, Monitor, NotificationHub};
use vault_sentinel::resolution::{ResolutionResolver, ResolutionStore};
use vault_sentinel::shutdown::shutdown_signal;
use vault_sentinel::utils::logging::init_logging;
use vault_sentinel::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 환경변수 로드
    dotenvy::dotenv().ok();

    // 2. 로깅 초기화 (guard는 main 종료까지 유지)
    let _log_guard = init_logging();
    init_start_time();

    // 3. 설정 로드
    let config = AppConfig::from_env()?;
    tracing::info!(
        log_file = %config.log_file.display(),
        store = %config.store_path.display(),
        poll_interval_ms = config.poll_interval_ms,
        vault_addr = ?config.vault_addr,
        "Configuration loaded"
    );

    // 4. 파이프라인 구성
    let store = Arc::new(ResolutionStore::new(&config.store_path));
    let oracle = OpenAiOracle::new(&config.openai_api_key, config.openai_model.clone());
    let oracle_enabled = oracle.is_enabled();
    let resolver = Arc::new(
        ResolutionResolver::new(store, Arc::new(oracle), config.oracle_timeout())
            .with_address(config.vault_addr.clone()),
    );
    let monitor = Arc::new(Monitor::new(
        Classifier::default(),
        resolver,
        Arc::new(NotificationHub::new()),
    ));
    let monitor_handle = monitor.spawn(&config.log_file, config.poll_interval());

    let state = AppState {
        replace_signal: monitor_handle.replace_signal(),
        config: config.clone(),
        monitor,
        oracle_enabled,
    };

    // 5. 서버 실행
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. 모니터 종료
    monitor_handle.shutdown().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
