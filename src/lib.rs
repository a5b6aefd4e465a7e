pub mod config;
pub mod domain;
pub mod monitoring;
pub mod resolution;
pub mod shutdown;
pub mod state;
pub mod utils;

pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        domain::health::handler::root,
        domain::health::handler::health_check,
        domain::health::handler::status_check,
        domain::issue::handler::get_logs,
        domain::issue::handler::upload_logs,
        domain::issue::handler::list_resolutions,
        domain::issue::handler::search,
        domain::issue::ws::issues_ws,
    ),
    components(
        schemas(
            domain::health::dto::HealthStatus,
            domain::health::dto::HealthState,
            domain::health::dto::HealthChecks,
            domain::health::dto::CheckResult,
            domain::issue::dto::UploadResult,
            domain::issue::dto::SearchRequest,
            domain::issue::dto::SearchResult,
            domain::issue::dto::ResolutionItem,
            utils::response::ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "상태 점검 API"),
        (name = "Logs", description = "Vault 로그 조회/교체 API"),
        (name = "Resolutions", description = "에러 해결책 조회 및 실시간 알림 API")
    )
)]
pub struct ApiDoc;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(domain::health::root))
        .route("/health", get(domain::health::health_check))
        .route("/api/status", get(domain::health::status_check))
        .route(
            "/api/logs",
            get(domain::issue::get_logs).put(domain::issue::upload_logs),
        )
        .route("/api/resolutions", get(domain::issue::list_resolutions))
        .route("/api/search", post(domain::issue::search))
        .route("/ws/issues", get(domain::issue::issues_ws))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
