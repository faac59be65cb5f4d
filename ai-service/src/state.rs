//! Application state for ai service.

use std::sync::Arc;

use common::config::{AppConfig, LlmSettings};
use common::errors::{AppError, AppResult};

use crate::generator::QueryGenerator;
use crate::llm::{GeminiClient, LlmClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    generator: Result<QueryGenerator, String>,
}

impl AppState {
    /// Builds the state from model settings.
    ///
    /// A missing or invalid key does not stop the service; it is logged here
    /// once and every generate call answers with the configuration error.
    pub fn new(config: AppConfig, settings: AppResult<LlmSettings>) -> Self {
        let generator = settings
            .and_then(|s| GeminiClient::new(&s))
            .map(|client| QueryGenerator::new(Arc::new(client)))
            .map_err(|e| {
                tracing::error!(error = %e, "模型未配置，生成接口将不可用");
                e.message().to_string()
            });
        Self { config, generator }
    }

    /// Builds the state around an existing model client.
    pub fn with_llm(config: AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            generator: Ok(QueryGenerator::new(llm)),
        }
    }

    /// The configured generator, or the configuration error recorded at startup.
    pub fn generator(&self) -> AppResult<&QueryGenerator> {
        self.generator
            .as_ref()
            .map_err(|reason| AppError::Configuration(reason.clone()))
    }
}
