//! Application state for query service.

use common::config::AppConfig;

use crate::executor::QueryExecutor;
use crate::pool::DatabasePool;
use crate::service::QueryService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: DatabasePool,
    pub service: QueryService,
}

impl AppState {
    /// Creates a new application state around an already-built pool.
    pub fn new(config: AppConfig, pool: DatabasePool) -> Self {
        let service = QueryService::new(QueryExecutor::new(pool.clone()), config.query_policy);
        Self {
            config,
            pool,
            service,
        }
    }
}
