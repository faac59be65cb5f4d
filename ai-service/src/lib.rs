//! AI 智能查询服务
//!
//! 提供自然语言转 SQL 功能，包括：
//! - 固定提示词与示例
//! - 调用 Gemini 生成查询
//! - 清理模型输出中的代码块标记

pub mod generator;
pub mod handlers;
pub mod llm;
pub mod prompt;
pub mod routes;
pub mod state;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use generator::{clean_generated_sql, QueryGenerator};
pub use llm::{GeminiClient, LlmClient};
pub use state::AppState;

pub const SERVICE_NAME: &str = "ai-service";
pub const DEFAULT_PORT: u16 = 8083;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI 服务 API",
        version = "0.1.0",
        description = "自然语言转 SQL 微服务"
    ),
    paths(
        handlers::generate_sql,
        handlers::health_check,
    ),
    components(schemas(
        common::models::GenerateRequest,
        common::models::GeneratedSql,
        handlers::HealthResponse,
    )),
    tags(
        (name = "generate", description = "SQL 生成端点"),
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
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
