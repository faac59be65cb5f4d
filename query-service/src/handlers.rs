//! Handler模块

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::monitor::ConnectionPoolStats;
use common::models::query::{QueryRequest, QueryResult};
use common::response::ApiResponse;

use crate::state::AppState;

/// 执行 SQL 查询
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "查询执行成功", body = ApiResponse<QueryResult>),
        (status = 400, description = "SQL 为空或被查询策略拒绝"),
        (status = 422, description = "数据库拒绝执行该语句"),
        (status = 503, description = "数据库不可用")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    req.validate()?;

    let result = state.service.execute(req).await?;
    let elapsed = result.execution_time_ms;
    Ok(Json(
        ApiResponse::ok_with_service(result, "query-service")
            .with_request_id(request_id.as_str())
            .with_duration(elapsed),
    ))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "query-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        db_type: Some(state.pool.db_type().to_string()),
        policy: Some(state.config.query_policy.to_string()),
        pool: Some(state.pool.stats()),
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<ConnectionPoolStats>,
}
