//! 下游服务客户端
//!
//! 下游服务无论成功失败都返回统一的响应信封，这里把信封还原成
//! 数据或 `AppError`。网络层失败统一视为外部服务错误。

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use common::errors::{AppError, AppResult};
use common::models::generation::{GenerateRequest, GeneratedSql};
use common::models::query::{QueryRequest, QueryResult};
use common::response::ApiResponse;

use crate::orchestrator::{SqlGenerator, SqlRunner};
use crate::routes::ServiceHealth;

async fn post_envelope<B, T>(client: &Client, service: &str, url: &str, body: &B) -> AppResult<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| AppError::ExternalService(format!("无法连接到 {}: {}", service, e)))?;

    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
        AppError::ExternalService(format!("{} 返回无效响应 (HTTP {}): {}", service, status, e))
    })?;
    envelope.into_result()
}

/// 下游健康检查响应中关心的字段
#[derive(Deserialize)]
struct HealthStatus {
    status: String,
}

/// 只有下游自报 `healthy` 才算健康，`degraded` 等状态带上原因
async fn check_health(client: &Client, name: &str, base_url: &str) -> ServiceHealth {
    let health_url = format!("{}/api/health", base_url);

    let error = match client.get(&health_url).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<HealthStatus>().await {
                Ok(health) if health.status == "healthy" => None,
                Ok(health) => Some(format!("服务状态: {}", health.status)),
                Err(e) => Some(format!("无效的健康检查响应: {}", e)),
            }
        }
        Ok(response) => Some(format!("HTTP {}", response.status())),
        Err(e) => Some(e.to_string()),
    };
    ServiceHealth {
        name: name.to_string(),
        url: base_url.to_string(),
        healthy: error.is_none(),
        error,
    }
}

/// ai-service 客户端
#[derive(Clone)]
pub struct AiServiceClient {
    client: Client,
    base_url: String,
}

impl AiServiceClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn health(&self) -> ServiceHealth {
        check_health(&self.client, "ai-service", &self.base_url).await
    }
}

#[async_trait]
impl SqlGenerator for AiServiceClient {
    async fn generate(&self, question: &str) -> AppResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let generated: GeneratedSql =
            post_envelope(&self.client, "ai-service", &url, &GenerateRequest::new(question)).await?;
        Ok(generated.sql)
    }
}

/// query-service 客户端
#[derive(Clone)]
pub struct QueryServiceClient {
    client: Client,
    base_url: String,
}

impl QueryServiceClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn health(&self) -> ServiceHealth {
        check_health(&self.client, "query-service", &self.base_url).await
    }
}

#[async_trait]
impl SqlRunner for QueryServiceClient {
    async fn run(&self, sql: &str) -> AppResult<QueryResult> {
        let url = format!("{}/api/query", self.base_url);
        post_envelope(&self.client, "query-service", &url, &QueryRequest::new(sql)).await
    }
}
