//! 网关路由模块

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::middleware::RequestId;
use common::response::ApiResponse;

use crate::orchestrator::AskOutcome;
use crate::state::AppState;
use crate::view;

/// 创建网关路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/ask", post(ask_form))
        .route("/api/ask", post(ask_api))
        .route("/api/health", get(health_check))
        .route("/api/health/all", get(aggregated_health))
}

/// 提问请求
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AskRequest {
    /// 自然语言问题
    #[serde(default)]
    pub question: String,
}

/// 首页
pub async fn index() -> Html<String> {
    Html(view::render_page("", &AskOutcome::Idle))
}

/// 表单提交，返回带结果的页面
pub async fn ask_form(State(state): State<AppState>, Form(req): Form<AskRequest>) -> Html<String> {
    let outcome = state.orchestrator.ask(&req.question).await;
    Html(view::render_page(&req.question, &outcome))
}

/// 提问并返回结果状态
#[utoipa::path(
    post,
    path = "/api/ask",
    tag = "gateway",
    request_body = AskRequest,
    responses(
        (status = 200, description = "提问处理完成，结果见 state 字段", body = ApiResponse<AskOutcome>)
    )
)]
pub async fn ask_api(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<AskRequest>,
) -> Json<ApiResponse<AskOutcome>> {
    let outcome = state.orchestrator.ask(&req.question).await;
    Json(ApiResponse::ok_with_service(outcome, "gateway").with_request_id(request_id.as_str()))
}

/// 网关健康检查
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "网关运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// 聚合所有服务的健康检查
#[utoipa::path(
    get,
    path = "/api/health/all",
    tag = "health",
    responses(
        (status = 200, description = "聚合健康状态", body = AggregatedHealth)
    )
)]
pub async fn aggregated_health(State(state): State<AppState>) -> Json<AggregatedHealth> {
    let (ai, query) = tokio::join!(state.ai_client.health(), state.query_client.health());
    let services = vec![ai, query];
    let all_healthy = services.iter().all(|s| s.healthy);

    Json(AggregatedHealth {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        services,
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}

/// 聚合健康响应
#[derive(Serialize, ToSchema)]
pub struct AggregatedHealth {
    /// 整体状态
    pub status: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 各服务健康状态
    pub services: Vec<ServiceHealth>,
}

/// 单个服务健康状态
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    /// 服务名称
    pub name: String,
    /// 服务地址
    pub url: String,
    /// 是否健康
    pub healthy: bool,
    /// 错误信息（如果不健康）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
