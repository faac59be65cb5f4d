//! Application state for gateway service.

use std::sync::Arc;
use std::time::Duration;

use common::config::{AppConfig, ServiceUrls};
use common::errors::{AppError, AppResult};

use crate::clients::{AiServiceClient, QueryServiceClient};
use crate::orchestrator::Orchestrator;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service_urls: ServiceUrls,
    pub ai_client: AiServiceClient,
    pub query_client: QueryServiceClient,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Creates a new application state talking to the given services.
    pub fn new(config: AppConfig, service_urls: ServiceUrls) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let ai_client = AiServiceClient::new(http_client.clone(), service_urls.ai_service.clone());
        let query_client = QueryServiceClient::new(http_client, service_urls.query_service.clone());
        let orchestrator = Orchestrator::new(
            Arc::new(ai_client.clone()),
            Arc::new(query_client.clone()),
        );

        Ok(Self {
            config,
            service_urls,
            ai_client,
            query_client,
            orchestrator,
        })
    }
}
