//! Handler模块

use std::time::Instant;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::generation::{GenerateRequest, GeneratedSql};
use common::response::ApiResponse;

use crate::state::AppState;

/// 根据自然语言问题生成 SQL
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "生成成功", body = ApiResponse<GeneratedSql>),
        (status = 400, description = "问题为空"),
        (status = 502, description = "模型调用失败或未返回可用 SQL"),
        (status = 503, description = "模型未配置")
    )
)]
pub async fn generate_sql(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GeneratedSql>>, AppError> {
    req.validate()?;
    let generator = state.generator()?;

    let start = Instant::now();
    let generated = generator.generate(&req.question).await?;
    Ok(Json(
        ApiResponse::ok_with_service(generated, "ai-service")
            .with_request_id(request_id.as_str())
            .with_duration(start.elapsed().as_millis() as u64),
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
    let (status, model) = match state.generator() {
        Ok(generator) => ("healthy", Some(generator.model().to_string())),
        Err(_) => ("degraded", None),
    };
    Json(HealthResponse {
        status: status.to_string(),
        service: "ai-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        model,
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
