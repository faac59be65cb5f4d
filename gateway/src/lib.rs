//! API 网关服务
//!
//! 作为用户请求的入口点，提供以下功能：
//! - 单页提问界面（服务端渲染）
//! - 编排 SQL 生成与查询执行
//! - 聚合下游服务健康状态

pub mod clients;
pub mod orchestrator;
pub mod routes;
pub mod state;
pub mod view;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id_middleware;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use orchestrator::{AskOutcome, FailureKind, Orchestrator, SqlGenerator, SqlRunner};
pub use state::AppState;

pub const SERVICE_NAME: &str = "gateway";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SQL 助手 API",
        version = "0.1.0",
        description = "自然语言查询 API 网关"
    ),
    paths(
        routes::ask_api,
        routes::health_check,
        routes::aggregated_health,
    ),
    components(schemas(
        routes::AskRequest,
        orchestrator::AskOutcome,
        orchestrator::FailureKind,
        routes::HealthResponse,
        routes::AggregatedHealth,
        routes::ServiceHealth,
    )),
    tags(
        (name = "gateway", description = "网关端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::config::{AppConfig, ServiceUrls};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    /// 下游服务地址指向不可达端口
    fn app() -> Router {
        let unreachable = |key: &str| match key {
            "AI_SERVICE_URL" | "QUERY_SERVICE_URL" => Some("http://127.0.0.1:1".to_string()),
            _ => None,
        };
        let config = AppConfig::from_lookup(SERVICE_NAME, DEFAULT_PORT, |_: &str| None);
        let state = AppState::new(config, ServiceUrls::from_lookup(unreachable)).unwrap();
        create_router(state)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Gemini SQL Query Generator"));
        assert!(page.contains(r#"action="/ask""#));
    }

    #[tokio::test]
    async fn test_blank_form_submission_stays_idle() {
        let response = app()
            .oneshot(
                Request::post("/ask")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("question=+++"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(!page.contains("class=\"error\""));
        assert!(!page.contains("<pre>"));
    }

    #[tokio::test]
    async fn test_unreachable_ai_service_is_generation_failure() {
        let response = app()
            .oneshot(
                Request::post("/api/ask")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"question":"sales per city"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["data"]["state"], "generation_failed");
    }

    #[tokio::test]
    async fn test_aggregated_health_is_degraded() {
        let response = app()
            .oneshot(Request::get("/api/health/all").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"].as_array().unwrap().len(), 2);
    }
}
