//! 查询执行器
//!
//! 每次调用从共享连接池借出一个连接执行单条语句。借出守卫只在调用期间存活，
//! 任何返回路径上连接都会归还连接池。

use std::time::Instant;

use serde_json::Value;
use sqlx::{Column, Executor, Row};

use common::errors::{AppError, AppResult};
use common::models::query::{ColumnInfo, QueryResult};
use common::utils::SqlValidator;

use crate::decode::{column_info, mysql_value, postgres_value, sqlite_value};
use crate::pool::DatabasePool;

/// 语句执行结果（尚未附加耗时）
enum Fetched {
    Rows(Vec<ColumnInfo>, Vec<Vec<Value>>),
    Affected(u64),
}

/// 借出连接、执行语句并解析结果
macro_rules! run_statement {
    ($pool:expr, $sql:expr, $decode:path) => {{
        let mut conn = $pool.acquire().await.map_err(classify)?;
        if SqlValidator::is_modification($sql) {
            let done = sqlx::query($sql)
                .execute(&mut *conn)
                .await
                .map_err(classify)?;
            Fetched::Affected(done.rows_affected())
        } else {
            let rows = sqlx::query($sql)
                .fetch_all(&mut *conn)
                .await
                .map_err(classify)?;
            let columns: Vec<ColumnInfo> = match rows.first() {
                Some(first) => first.columns().iter().map(column_info).collect(),
                // 没有数据行可取列名，改由驱动描述语句
                None => match (&mut *conn).describe($sql).await {
                    Ok(described) => described.columns().iter().map(column_info).collect(),
                    Err(e) => {
                        tracing::debug!(error = %e, "无法描述语句，空结果不带列名");
                        Vec::new()
                    }
                },
            };
            let data: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| (0..columns.len()).map(|i| $decode(row, i)).collect())
                .collect();
            Fetched::Rows(columns, data)
        }
    }};
}

/// 把驱动错误映射为应用错误
///
/// 数据库返回的错误与连接失败属于数据库错误，其余（解码失败等）为意外错误。
pub fn classify(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db_err) => AppError::DatabaseQuery(db_err.message().to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => AppError::DatabaseConnection(err.to_string()),
        other => AppError::Unexpected(other.to_string()),
    }
}

/// 在注入的连接池上执行生成的 SQL
#[derive(Clone)]
pub struct QueryExecutor {
    pool: DatabasePool,
}

impl QueryExecutor {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// 执行单条语句，返回全部数据行及列名
    ///
    /// 发送前去掉末尾分号，其余文本原样执行。
    ///
    /// # Errors
    /// 数据库报错或连接失败返回 `DatabaseQuery`/`DatabaseConnection`，
    /// 其他失败返回 `Unexpected`。
    pub async fn execute(&self, sql: &str) -> AppResult<QueryResult> {
        let sql = sql.trim().trim_end_matches(';').trim_end();
        if sql.is_empty() {
            return Err(AppError::Validation("SQL statement is required".into()));
        }

        let start = Instant::now();
        let fetched = match &self.pool {
            DatabasePool::MySQL(pool) => run_statement!(pool, sql, mysql_value),
            DatabasePool::Postgres(pool) => run_statement!(pool, sql, postgres_value),
            DatabasePool::SQLite(pool) => run_statement!(pool, sql, sqlite_value),
        };
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let result = match fetched {
            Fetched::Affected(affected) => QueryResult::affected(affected, execution_time_ms),
            Fetched::Rows(columns, rows) => QueryResult {
                row_count: rows.len(),
                columns,
                rows,
                affected_rows: None,
                truncated: false,
                execution_time_ms,
            },
        };

        tracing::info!(
            rows = result.row_count,
            columns = result.columns.len(),
            affected = ?result.affected_rows,
            elapsed_ms = execution_time_ms,
            "查询执行完成"
        );
        Ok(result)
    }

    /// 执行语句，失败时返回空结果并附带错误
    ///
    /// 供总是渲染表格的调用方使用：失败不会中断调用，错误与空结果一起返回，
    /// 由调用方负责展示。HTTP 接口走 [`execute`](Self::execute)，
    /// 错误以响应信封返回。
    pub async fn execute_or_empty(&self, sql: &str) -> (QueryResult, Option<AppError>) {
        match self.execute(sql).await {
            Ok(result) => (result, None),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "查询执行失败");
                (QueryResult::empty(), Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sales_pool, HIGHEST_CITY_2024};
    use serde_json::json;

    #[tokio::test]
    async fn test_select_returns_rows_and_columns_in_order() {
        let (_dir, pool) = sales_pool(2).await;
        let executor = QueryExecutor::new(pool);

        let result = executor
            .execute("SELECT City, Quantity, Sales FROM sales_data ORDER BY sale_date")
            .await
            .unwrap();

        assert_eq!(result.column_names(), vec!["City", "Quantity", "Sales"]);
        assert_eq!(result.row_count, 5);
        assert_eq!(result.rows.len(), 5);
        assert!(result.rows.iter().all(|r| r.len() == 3));
        assert_eq!(result.rows[0], vec![json!("Delhi"), json!(10), json!(5000.0)]);
    }

    #[tokio::test]
    async fn test_highest_city_query() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        let result = executor.execute(HIGHEST_CITY_2024).await.unwrap();

        assert_eq!(result.column_names(), vec!["City", "Total_Sales"]);
        assert_eq!(result.rows, vec![vec![json!("Delhi"), json!(750.5)]]);
    }

    #[tokio::test]
    async fn test_empty_result_keeps_column_names() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        let result = executor
            .execute("SELECT City, Sales FROM sales_data WHERE City = 'Atlantis'")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.column_names(), vec!["City", "Sales"]);
    }

    #[tokio::test]
    async fn test_rejected_sql_yields_empty_result_and_database_error() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        let (result, err) = executor.execute_or_empty("SELEC 1").await;

        assert_eq!(result, QueryResult::empty());
        assert!(result.columns.is_empty());
        assert!(matches!(err, Some(AppError::DatabaseQuery(_))));
    }

    #[tokio::test]
    async fn test_trailing_semicolon_is_tolerated() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        let result = executor.execute("SELECT COUNT(*) AS n FROM sales_data;").await.unwrap();
        assert_eq!(result.rows, vec![vec![json!(5)]]);
    }

    #[tokio::test]
    async fn test_modification_reports_affected_rows() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        let result = executor
            .execute("UPDATE sales_data SET Channel = 'Online' WHERE City = 'Delhi'")
            .await
            .unwrap();
        assert_eq!(result.affected_rows, Some(2));
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn test_blank_sql_is_validation_error() {
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);
        assert!(matches!(
            executor.execute("  ;  ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_returned_after_failures() {
        // With a single connection, any leaked checkout would make the final
        // query time out.
        let (_dir, pool) = sales_pool(1).await;
        let executor = QueryExecutor::new(pool);

        for _ in 0..5 {
            let (_, err) = executor.execute_or_empty("SELECT nope FROM missing_table").await;
            assert!(err.is_some());
        }
        let result = executor.execute("SELECT City FROM sales_data").await.unwrap();
        assert_eq!(result.row_count, 5);
    }

    #[tokio::test]
    async fn test_checkouts_never_exceed_pool_size() {
        let (_dir, pool) = sales_pool(2).await;
        let executor = QueryExecutor::new(pool.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let executor = executor.clone();
                tokio::spawn(async move {
                    let sql = if i % 2 == 0 {
                        "SELECT City FROM sales_data"
                    } else {
                        "SELEC broken"
                    };
                    executor.execute_or_empty(sql).await
                })
            })
            .collect();

        for handle in handles {
            let (result, err) = handle.await.unwrap();
            assert!(err.is_some() || result.row_count == 5);
            let stats = pool.stats();
            assert!(stats.active + stats.idle <= stats.max_size);
        }

        assert_eq!(pool.stats().max_size, 2);
        let result = executor.execute("SELECT City FROM sales_data").await.unwrap();
        assert_eq!(result.row_count, 5);
    }
}
