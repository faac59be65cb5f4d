//! SQL query models.
//!
//! Contains models for SQL query execution.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for executing a SQL query.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// SQL statement to execute.
    #[validate(length(min = 1, message = "SQL statement is required"))]
    pub sql: String,

    /// Maximum number of rows to return; every row when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl QueryRequest {
    /// Creates a request that returns every row.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            limit: None,
        }
    }
}

/// Result of a SQL query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information, in projected order.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values), in database order.
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned.
    #[serde(default)]
    pub row_count: usize,

    /// Number of rows affected (for INSERT/UPDATE/DELETE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    /// Whether rows were dropped to honour the request limit.
    #[serde(default)]
    pub truncated: bool,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// Column information in query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,

    /// Whether the column is nullable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            affected_rows: None,
            truncated: false,
            execution_time_ms: 0,
        }
    }

    /// Creates a query result with affected rows count (for non-SELECT queries).
    pub fn affected(affected: u64, execution_time_ms: u64) -> Self {
        Self {
            affected_rows: Some(affected),
            execution_time_ms,
            ..Self::empty()
        }
    }

    /// Column names in projected order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether no rows came back.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps at most `limit` rows, flagging the result as truncated if any were dropped.
    pub fn truncate(&mut self, limit: usize) {
        if self.rows.len() > limit {
            self.rows.truncate(limit);
            self.truncated = true;
        }
        self.row_count = self.rows.len();
    }
}
