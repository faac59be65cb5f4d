//! 查询执行服务模块

use common::errors::AppResult;
use common::models::query::{QueryRequest, QueryResult};
use common::utils::{QueryPolicy, SqlValidator};

use crate::executor::QueryExecutor;

/// SQL 查询执行服务
///
/// 先按策略校验语句，再交给执行器运行。
#[derive(Clone)]
pub struct QueryService {
    executor: QueryExecutor,
    validator: SqlValidator,
}

impl QueryService {
    /// 创建新的查询服务实例
    pub fn new(executor: QueryExecutor, policy: QueryPolicy) -> Self {
        let validator = SqlValidator::new(policy, executor.pool().db_type());
        Self {
            executor,
            validator,
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// 执行 SQL 查询
    pub async fn execute(&self, req: QueryRequest) -> AppResult<QueryResult> {
        if let Err(e) = self.validator.validate(&req.sql) {
            tracing::warn!(policy = %self.validator.policy(), error = %e, "SQL 被策略拒绝");
            return Err(e);
        }
        if !SqlValidator::is_select(&req.sql) {
            tracing::debug!(policy = %self.validator.policy(), "执行非 SELECT 语句");
        }

        let mut result = self.executor.execute(&req.sql).await?;
        if let Some(limit) = req.limit {
            result.truncate(limit as usize);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sales_pool, HIGHEST_CITY_2024};
    use common::errors::AppError;

    #[tokio::test]
    async fn test_read_only_policy_rejects_mutation() {
        let (_dir, pool) = sales_pool(1).await;
        let service = QueryService::new(QueryExecutor::new(pool), QueryPolicy::ReadOnly);

        let err = service
            .execute(QueryRequest::new("DELETE FROM sales_data"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsafeSql(_)));

        // Nothing was deleted.
        let result = service
            .execute(QueryRequest::new("SELECT COUNT(*) FROM sales_data"))
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], serde_json::json!(5));
    }

    #[tokio::test]
    async fn test_read_only_policy_allows_select() {
        let (_dir, pool) = sales_pool(1).await;
        let service = QueryService::new(QueryExecutor::new(pool), QueryPolicy::ReadOnly);

        let result = service.execute(QueryRequest::new(HIGHEST_CITY_2024)).await.unwrap();
        assert_eq!(result.row_count, 1);
    }

    #[tokio::test]
    async fn test_limit_truncates_rows() {
        let (_dir, pool) = sales_pool(1).await;
        let service = QueryService::new(QueryExecutor::new(pool), QueryPolicy::ReadOnly);

        let req = QueryRequest {
            sql: "SELECT City FROM sales_data".to_string(),
            limit: Some(2),
        };
        let result = service.execute(req).await.unwrap();

        assert_eq!(result.row_count, 2);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn test_default_request_returns_every_row() {
        let (_dir, pool) = sales_pool(1).await;
        let service = QueryService::new(QueryExecutor::new(pool), QueryPolicy::ReadOnly);

        let result = service
            .execute(QueryRequest::new(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 1500) \
                 SELECT x FROM n",
            ))
            .await
            .unwrap();

        assert_eq!(result.row_count, 1500);
        assert_eq!(result.rows.len(), 1500);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_unrestricted_policy_runs_mutation() {
        let (_dir, pool) = sales_pool(1).await;
        let service = QueryService::new(QueryExecutor::new(pool), QueryPolicy::Unrestricted);

        let result = service
            .execute(QueryRequest::new("DELETE FROM sales_data WHERE City = 'Pune'"))
            .await
            .unwrap();
        assert_eq!(result.affected_rows, Some(1));
    }
}
