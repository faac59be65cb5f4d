//! SQL statement validator.
//!
//! Model output is untrusted text. Before it reaches the database it is
//! checked against the configured [`QueryPolicy`].

use serde::{Deserialize, Serialize};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::errors::{AppError, AppResult};
use crate::models::connection::DbType;

/// How much of the generated SQL is allowed to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPolicy {
    /// Parse the statement and allow only a single read-only statement.
    #[default]
    ReadOnly,
    /// Refuse statements containing destructive keywords.
    Guarded,
    /// Execute whatever the model produced.
    Unrestricted,
}

impl std::str::FromStr for QueryPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "read_only" | "readonly" => Ok(QueryPolicy::ReadOnly),
            "guarded" => Ok(QueryPolicy::Guarded),
            "unrestricted" => Ok(QueryPolicy::Unrestricted),
            other => Err(AppError::Configuration(format!(
                "unknown query policy: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for QueryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryPolicy::ReadOnly => write!(f, "read_only"),
            QueryPolicy::Guarded => write!(f, "guarded"),
            QueryPolicy::Unrestricted => write!(f, "unrestricted"),
        }
    }
}

/// List of forbidden SQL keywords for the guarded policy.
const FORBIDDEN_KEYWORDS: [&str; 4] = ["DROP ", "TRUNCATE ", "DELETE FROM", "ALTER "];

/// Validates SQL statements against a [`QueryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct SqlValidator {
    policy: QueryPolicy,
    db_type: DbType,
}

impl SqlValidator {
    pub fn new(policy: QueryPolicy, db_type: DbType) -> Self {
        Self { policy, db_type }
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    /// Validates a SQL statement under the configured policy.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if the statement is not allowed to run.
    pub fn validate(&self, sql: &str) -> AppResult<()> {
        match self.policy {
            QueryPolicy::ReadOnly => self.validate_read_only(sql),
            QueryPolicy::Guarded => Self::validate_keywords(sql),
            QueryPolicy::Unrestricted => Ok(()),
        }
    }

    fn validate_read_only(&self, sql: &str) -> AppResult<()> {
        let statements = match self.db_type {
            DbType::MySQL => parse(&MySqlDialect {}, sql),
            DbType::Postgres => parse(&PostgreSqlDialect {}, sql),
            DbType::SQLite => parse(&SQLiteDialect {}, sql),
        }?;

        match statements.as_slice() {
            [] => Err(AppError::UnsafeSql("no statement to execute".into())),
            [statement] if is_read_only(statement) => Ok(()),
            [_] => Err(AppError::UnsafeSql(format!(
                "only read-only queries are allowed, got {}",
                leading_keyword(sql)
            ))),
            many => Err(AppError::UnsafeSql(format!(
                "expected a single statement, got {}",
                many.len()
            ))),
        }
    }

    /// Validates a SQL statement for forbidden operations.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if the SQL contains forbidden keywords.
    pub fn validate_keywords(sql: &str) -> AppResult<()> {
        let sql_upper = sql.to_uppercase();
        for keyword in FORBIDDEN_KEYWORDS {
            if sql_upper.contains(keyword) {
                return Err(AppError::UnsafeSql(format!(
                    "forbidden operation: {}",
                    keyword.trim()
                )));
            }
        }
        Ok(())
    }

    /// Checks if the SQL is a SELECT query.
    pub fn is_select(sql: &str) -> bool {
        sql.trim().to_uppercase().starts_with("SELECT")
    }

    /// Checks if the SQL is a modification query (INSERT/UPDATE/DELETE).
    pub fn is_modification(sql: &str) -> bool {
        let sql_upper = sql.trim().to_uppercase();
        sql_upper.starts_with("INSERT")
            || sql_upper.starts_with("UPDATE")
            || sql_upper.starts_with("DELETE")
            || sql_upper.starts_with("REPLACE")
    }
}

fn parse(dialect: &dyn Dialect, sql: &str) -> AppResult<Vec<Statement>> {
    Parser::parse_sql(dialect, sql)
        .map_err(|e| AppError::UnsafeSql(format!("cannot verify query safety: {}", e)))
}

fn is_read_only(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => is_read_only_query(query),
        Statement::Explain { analyze, statement, .. } => !analyze && is_read_only(statement),
        Statement::ExplainTable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. } => true,
        _ => false,
    }
}

/// A query is read-only only if every CTE and the body are.
///
/// Postgres allows `INSERT`/`UPDATE`/`DELETE ... RETURNING` inside `WITH`.
fn is_read_only_query(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| is_read_only_query(&cte.query)));
    ctes_read_only && is_read_only_body(&query.body)
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_none(),
        SetExpr::Query(query) => is_read_only_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        _ => false,
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}
