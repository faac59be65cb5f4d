//! Natural-language to SQL generation models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Request body for generating SQL from a question.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenerateRequest {
    /// The analyst's question in plain English.
    #[validate(custom(function = "not_blank", message = "Question is required"))]
    pub question: String,
}

impl GenerateRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// SQL produced by the model after cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedSql {
    /// The cleaned, single SQL statement.
    pub sql: String,

    /// Model that produced the statement.
    pub model: String,

    /// Length of the raw model output before cleanup.
    pub raw_length: usize,
}
