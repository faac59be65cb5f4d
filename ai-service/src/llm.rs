//! 大模型客户端模块
//!
//! 通过 Generative Language API 的 `generateContent` 接口生成文本。
//! 调用失败直接返回错误，不做重试。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use common::config::LlmSettings;
use common::errors::{AppError, AppResult};

/// 文本生成接口
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 按顺序发送多段输入，返回模型生成的原始文本
    async fn generate_content(&self, parts: &[&str]) -> AppResult<String>;

    /// 模型名称
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// 第一个候选结果中所有文本片段的拼接
    fn into_text(self) -> AppResult<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AppError::Generation(format!("prompt blocked: {}", reason)));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("model returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(AppError::Generation(format!(
                "model returned no text (finish reason: {})",
                reason
            )));
        }
        Ok(text)
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// 根据配置创建客户端
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_content(&self, parts: &[&str]) -> AppResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: parts.iter().map(|&text| RequestPart { text }).collect(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = %status, model = %self.model, "模型接口返回错误");
            return Err(AppError::Generation(format!("{} {}", status.as_u16(), message)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("failed to parse model response: {}", e)))?;

        body.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
