//! Application error types.
//!
//! Every failure in the pipeline is converted into one of these variants at
//! the boundary where it happens and rendered as an [`ApiResponse`] envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::response::ApiResponse;

/// Result alias used across all services.
pub type AppResult<T> = Result<T, AppError>;

/// Unified error type for all services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration (e.g. the model API key) is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The model call failed or produced no usable query.
    #[error("Error generating SQL: {0}")]
    Generation(String),

    /// The statement was refused by the active query policy.
    #[error("Unsafe SQL: {0}")]
    UnsafeSql(String),

    /// The database rejected the statement.
    #[error("Database error: {0}")]
    DatabaseQuery(String),

    /// The database could not be reached or a connection could not be checked out.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// A downstream service could not be reached or answered garbage.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Anything else.
    #[error("General error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Stable error code carried in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::DatabaseQuery(_) => "DATABASE_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_UNAVAILABLE",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::UnsafeSql(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The inner message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::Configuration(m)
            | AppError::Validation(m)
            | AppError::Generation(m)
            | AppError::UnsafeSql(m)
            | AppError::DatabaseQuery(m)
            | AppError::DatabaseConnection(m)
            | AppError::ExternalService(m)
            | AppError::Unexpected(m) => m,
        }
    }

    /// Whether the error came out of the database layer.
    pub fn is_database(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseQuery(_) | AppError::DatabaseConnection(_)
        )
    }

    /// Rebuilds an error received from another service's envelope.
    ///
    /// Unknown codes become [`AppError::Unexpected`].
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "CONFIGURATION_ERROR" => AppError::Configuration(message),
            "VALIDATION_ERROR" => AppError::Validation(message),
            "GENERATION_ERROR" => AppError::Generation(message),
            "UNSAFE_SQL" => AppError::UnsafeSql(message),
            "DATABASE_ERROR" => AppError::DatabaseQuery(message),
            "DATABASE_UNAVAILABLE" => AppError::DatabaseConnection(message),
            "EXTERNAL_SERVICE_ERROR" => AppError::ExternalService(message),
            _ => AppError::Unexpected(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            s if s.is_server_error() => {
                tracing::error!(code = self.code(), error = %self, "请求失败")
            }
            _ => tracing::warn!(code = self.code(), error = %self, "请求被拒绝"),
        }
        let body = ApiResponse::err(self.code(), self.message());
        (status, Json(body)).into_response()
    }
}
