use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::env::temp_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;
use vault_sentinel::config::AppConfig;
use vault_sentinel::domain::ai::ResolutionOracle;
use vault_sentinel::monitoring::{Classifier, Monitor, MonitorHandle, NotificationHub};
use vault_sentinel::resolution::{Resolution, ResolutionResolver, ResolutionStore};
use vault_sentinel::utils::AppError;
use vault_sentinel::{app, AppState};

const VAULT_ADDR: &str = "http://10.0.0.5:8200";

// ===== Helper Functions =====

/// Oracle answering every key with the same resolution
struct FixedOracle(Resolution);

#[async_trait::async_trait]
impl ResolutionOracle for FixedOracle {
    async fn query(&self, _error_key: &str) -> Result<Resolution, AppError> {
        Ok(self.0.clone())
    }
}

struct TestContext {
    state: AppState,
    log_file: PathBuf,
    _monitor: MonitorHandle,
}

impl TestContext {
    fn new(log_content: Option<&str>) -> Self {
        let test_dir = temp_dir().join(format!("test_api_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&test_dir).unwrap();
        let log_file = test_dir.join("vault.log");
        if let Some(content) = log_content {
            std::fs::write(&log_file, content).unwrap();
        }

        let config = AppConfig {
            server_port: 0,
            log_file: log_file.clone(),
            poll_interval_ms: 10,
            store_path: test_dir.join("knowledge_base.json"),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            oracle_timeout_secs: 5,
            vault_addr: Some(VAULT_ADDR.to_string()),
        };

        let store = Arc::new(ResolutionStore::new(&config.store_path));
        let oracle = Arc::new(FixedOracle(Resolution::Steps(vec![
            "export VAULT_ADDR=<ADDR>".to_string(),
            "vault operator unseal".to_string(),
        ])));
        let resolver = Arc::new(
            ResolutionResolver::new(store, oracle, Duration::from_secs(5))
                .with_address(config.vault_addr.clone()),
        );
        let monitor = Arc::new(Monitor::new(
            Classifier::default(),
            resolver,
            Arc::new(NotificationHub::new()),
        ));

        let handle = monitor.spawn(&log_file, config.poll_interval());

        Self {
            state: AppState {
                config,
                monitor,
                replace_signal: handle.replace_signal(),
                oracle_enabled: false,
            },
            log_file,
            _monitor: handle,
        }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }
}

/// Serve the router on an ephemeral port
async fn spawn_server(router: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn wait_for_subscribers(ctx: &TestContext, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while ctx.state.hub().subscriber_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("subscriber count never reached {}", expected));
}

async fn parse_response_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn create_json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ===== Health Tests =====

mod health {
    use super::*;

    #[tokio::test]
    async fn should_return_running_message_at_root() {
        let ctx = TestContext::new(Some(""));

        let response = ctx.router().oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["message"], "Vault sentinel is running");
    }

    #[tokio::test]
    async fn should_return_ok() {
        let ctx = TestContext::new(Some(""));

        let response = ctx.router().oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn should_report_degraded_without_oracle_key() {
        let ctx = TestContext::new(Some(""));

        let response = ctx.router().oneshot(get_request("/api/status")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["logFile"]["status"], true);
        assert_eq!(body["checks"]["oracle"]["status"], false);
    }

    #[tokio::test]
    async fn should_report_unhealthy_when_log_file_missing() {
        let ctx = TestContext::new(None);

        let response = ctx.router().oneshot(get_request("/api/status")).await.unwrap();

        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["status"], "unhealthy");
    }
}

// ===== Logs API Tests =====

mod logs_api {
    use super::*;

    #[tokio::test]
    async fn should_return_last_lines() {
        let ctx = TestContext::new(Some("one\ntwo\n\n  three  \nfour\n"));

        let response = ctx
            .router()
            .oneshot(get_request("/api/logs?limit=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["result"], json!(["three", "four"]));
    }

    #[tokio::test]
    async fn should_default_to_hundred_lines() {
        let content: String = (0..150).map(|i| format!("line {}\n", i)).collect();
        let ctx = TestContext::new(Some(&content));

        let response = ctx.router().oneshot(get_request("/api/logs")).await.unwrap();

        let body = parse_response_body(response.into_body()).await;
        let lines = body["result"].as_array().unwrap();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "line 50");
    }

    #[tokio::test]
    async fn should_return_404_when_log_file_missing() {
        let ctx = TestContext::new(None);

        let response = ctx.router().oneshot(get_request("/api/logs")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["code"], "LOG404");
    }

    #[tokio::test]
    async fn should_replace_log_file_on_upload() {
        let ctx = TestContext::new(Some("old content\n"));

        let request = Request::builder()
            .method("PUT")
            .uri("/api/logs")
            .header("Content-Type", "text/plain")
            .body(Body::from("core: vault is sealed\n"))
            .unwrap();
        let response = ctx.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["result"]["bytesWritten"], 22);
        assert_eq!(
            std::fs::read_to_string(&ctx.log_file).unwrap(),
            "core: vault is sealed\n"
        );
    }

    #[tokio::test]
    async fn should_notify_uploaded_fault_exactly_once() {
        // Arrange
        let ctx = TestContext::new(Some("old content\n"));
        let mut subscriber = ctx.state.hub().subscribe().await;
        // Tail must be following before the upload
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Act
        let request = Request::builder()
            .method("PUT")
            .uri("/api/logs")
            .header("Content-Type", "text/plain")
            .body(Body::from("2024-01-01 INFO: heartbeat ok\ncore: vault is sealed\n"))
            .unwrap();
        let response = ctx.router().oneshot(request).await.unwrap();
        let message = tokio::time::timeout(Duration::from_secs(2), subscriber.receiver.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("hub closed");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            message,
            format!(
                "Error: vault is sealed\nResolution:\nSTEP 1: export VAULT_ADDR={}\nSTEP 2: vault operator unseal\n",
                VAULT_ADDR
            )
        );
        assert!(subscriber.receiver.try_recv().is_err());
    }
}

// ===== WebSocket Tests =====

mod issues_ws {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

    #[tokio::test]
    async fn should_push_broadcasts_and_unsubscribe_on_close() {
        // Arrange
        let ctx = TestContext::new(Some(""));
        let addr = spawn_server(ctx.router()).await;
        let (mut ws_stream, _) = connect_async(format!("ws://{}/ws/issues", addr))
            .await
            .expect("failed to connect");
        wait_for_subscribers(&ctx, 1).await;

        // Act
        let delivered = ctx
            .state
            .hub()
            .broadcast("Error: lease expired\nResolution:\nrenew the lease")
            .await;
        let frame = tokio::time::timeout(Duration::from_secs(5), ws_stream.next())
            .await
            .expect("timeout waiting for notification")
            .expect("connection closed")
            .expect("frame error");
        ws_stream.close(None).await.expect("failed to close");

        // Assert
        assert_eq!(delivered, 1);
        match frame {
            Message::Text(text) => {
                assert_eq!(text.as_str(), "Error: lease expired\nResolution:\nrenew the lease")
            }
            other => panic!("expected text message, got: {:?}", other),
        }
        wait_for_subscribers(&ctx, 0).await;
    }

    #[tokio::test]
    async fn should_unsubscribe_when_client_drops_connection() {
        let ctx = TestContext::new(Some(""));
        let addr = spawn_server(ctx.router()).await;
        let (ws_stream, _) = connect_async(format!("ws://{}/ws/issues", addr))
            .await
            .expect("failed to connect");
        wait_for_subscribers(&ctx, 1).await;

        drop(ws_stream);

        wait_for_subscribers(&ctx, 0).await;
    }
}

// ===== Search / Resolutions API Tests =====

mod search_api {
    use super::*;

    const SEARCH_URI: &str = "/api/search";

    #[tokio::test]
    async fn should_return_400_with_empty_error() {
        let ctx = TestContext::new(Some(""));

        let response = ctx
            .router()
            .oneshot(create_json_request("POST", SEARCH_URI, json!({ "error": "" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["code"], "COMMON400");
    }

    #[tokio::test]
    async fn should_return_400_with_blank_error() {
        let ctx = TestContext::new(Some(""));

        let response = ctx
            .router()
            .oneshot(create_json_request("POST", SEARCH_URI, json!({ "error": "   " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_400_with_missing_error_field() {
        let ctx = TestContext::new(Some(""));

        let response = ctx
            .router()
            .oneshot(create_json_request("POST", SEARCH_URI, json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["isSuccess"], false);
    }

    #[tokio::test]
    async fn should_resolve_broadcast_and_persist() {
        // Arrange
        let ctx = TestContext::new(Some(""));
        let mut subscriber = ctx.state.hub().subscribe().await;

        // Act
        let response = ctx
            .router()
            .oneshot(create_json_request(
                "POST",
                SEARCH_URI,
                json!({ "error": "Vault Is Sealed" }),
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        assert_eq!(body["result"]["error"], "vault is sealed");
        assert_eq!(body["result"]["unavailable"], false);
        assert_eq!(
            body["result"]["resolution"],
            json!([format!("export VAULT_ADDR={}", VAULT_ADDR), "vault operator unseal"])
        );
        assert_eq!(
            subscriber.receiver.recv().await.unwrap(),
            format!(
                "Error: vault is sealed\nResolution:\nSTEP 1: export VAULT_ADDR={}\nSTEP 2: vault operator unseal\n",
                VAULT_ADDR
            )
        );
        assert_eq!(ctx.state.resolver().store().load().len(), 1);
    }

    #[tokio::test]
    async fn should_list_resolutions_with_address_substituted() {
        // Arrange
        let ctx = TestContext::new(Some(""));
        ctx.router()
            .oneshot(create_json_request(
                "POST",
                SEARCH_URI,
                json!({ "error": "lease expired" }),
            ))
            .await
            .unwrap();

        // Act
        let response = ctx
            .router()
            .oneshot(get_request("/api/resolutions"))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response.into_body()).await;
        let entries = body["result"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["error"], "lease expired");
        assert_eq!(
            entries[0]["resolution"][0],
            format!("export VAULT_ADDR={}", VAULT_ADDR)
        );
    }
}
