//! Configuration loading.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file). Each loader also has a `from_lookup` form that reads from an
//! arbitrary key lookup so tests never touch the real environment.

use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::models::connection::DbType;
use crate::utils::sql_validator::QueryPolicy;

/// Loads `.env` from the working directory if one exists.
///
/// Variables already present in the environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to parse .env file"),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Common service settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the running service.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Fixed connection pool size.
    pub max_connections: u32,
    /// How long a pool checkout may wait before failing.
    pub acquire_timeout_secs: u64,
    /// Statement policy applied before execution.
    pub query_policy: QueryPolicy,
}

impl AppConfig {
    /// Loads configuration for the named service from the environment.
    pub fn load_with_service(service_name: &str, default_port: u16) -> Self {
        Self::from_lookup(service_name, default_port, env_lookup)
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let query_policy = match lookup("QUERY_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown QUERY_POLICY, falling back to read_only");
                QueryPolicy::ReadOnly
            }),
            None => QueryPolicy::ReadOnly,
        };

        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(lookup("SERVER_PORT"), default_port),
            max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), 10),
            acquire_timeout_secs: parse_or(lookup("DB_ACQUIRE_TIMEOUT_SECS"), 30),
            query_policy,
        }
    }

    /// Address to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool checkout timeout as a [`Duration`].
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Base URLs of the downstream services the gateway talks to.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub ai_service: String,
    pub query_service: String,
}

impl ServiceUrls {
    /// Loads service URLs from the environment.
    pub fn load() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let trim = |url: String| url.trim_end_matches('/').to_string();
        Self {
            ai_service: lookup("AI_SERVICE_URL")
                .map(trim)
                .unwrap_or_else(|| "http://127.0.0.1:8083".to_string()),
            query_service: lookup("QUERY_SERVICE_URL")
                .map(trim)
                .unwrap_or_else(|| "http://127.0.0.1:8082".to_string()),
        }
    }
}

/// Connection settings for the sales database.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub db_type: DbType,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// SQLite file path.
    pub file_path: Option<String>,
    /// Full URL override (`DATABASE_URL`).
    pub url_override: Option<String>,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("file_path", &self.file_path)
            .field("url_override", &self.url_override.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl DatabaseSettings {
    /// Loads database settings from the environment.
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url_override = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let db_type = match (&url_override, lookup("DB_TYPE")) {
            (_, Some(raw)) => raw.parse()?,
            (Some(url), None) => DbType::from_url(url)?,
            (None, None) => DbType::MySQL,
        };

        let port = parse_or(lookup("DB_PORT"), db_type.default_port().unwrap_or(0));

        Ok(Self {
            host: lookup("DB_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            username: lookup("DB_USER").unwrap_or_else(|| "root".to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: lookup("DB_NAME").unwrap_or_else(|| "sales_data_db".to_string()),
            file_path: lookup("DB_FILE"),
            url_override,
            db_type,
        })
    }
}

/// Settings for the hosted language model.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Default model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Default Generative Language API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

impl LlmSettings {
    /// Loads model settings from the environment.
    ///
    /// # Errors
    /// Returns [`AppError::Configuration`] if no API key is set.
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GOOGLE_API_KEY")
            .or_else(|| lookup("Google_API_KEY"))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "Google API key not found in environment variables".into(),
                )
            })?;

        let model = lookup("GEMINI_MODEL")
            .map(|m| m.trim().trim_start_matches("models/").to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            model,
            api_base: lookup("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_secs: parse_or(lookup("LLM_TIMEOUT_SECS"), 60),
        })
    }
}
