//! SQL 查询执行服务
//!
//! 提供 SQL 查询执行功能，包括：
//! - 启动时建立固定大小的连接池
//! - 按查询策略校验语句
//! - 在借出的连接上执行查询并解析结果

pub mod decode;
pub mod executor;
pub mod handlers;
pub mod pool;
pub mod routes;
pub mod service;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use executor::QueryExecutor;
pub use pool::DatabasePool;
pub use state::AppState;

pub const SERVICE_NAME: &str = "query-service";
pub const DEFAULT_PORT: u16 = 8082;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "查询服务 API",
        version = "0.1.0",
        description = "SQL 查询执行微服务"
    ),
    paths(
        handlers::execute_query,
        handlers::health_check,
    ),
    components(schemas(
        common::models::QueryRequest,
        common::models::QueryResult,
        common::models::ColumnInfo,
        common::models::ConnectionPoolStats,
        handlers::HealthResponse,
    )),
    tags(
        (name = "query", description = "查询执行端点"),
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
