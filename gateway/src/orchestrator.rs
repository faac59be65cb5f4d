//! 查询编排模块
//!
//! 一次提问的完整流程：问题 → 生成 SQL → 执行 → 结果状态。
//! 每次调用相互独立，除连接池与进程配置外不保留任何状态。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::errors::{AppError, AppResult};
use common::models::query::QueryResult;

/// 把问题转成 SQL
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> AppResult<String>;
}

/// 执行 SQL
#[async_trait]
pub trait SqlRunner: Send + Sync {
    async fn run(&self, sql: &str) -> AppResult<QueryResult>;
}

/// 执行失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 数据库拒绝语句或无法连接
    Database,
    /// 其他错误
    Unexpected,
}

/// 一次提问的最终状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AskOutcome {
    /// 问题为空，未发起任何调用
    Idle,
    /// 模型调用失败或没有返回可用 SQL，未执行
    GenerationFailed { message: String },
    /// 生成的 SQL 被查询策略拒绝，未执行
    Rejected { sql: String, reason: String },
    /// 执行失败
    ExecutionFailed {
        sql: String,
        kind: FailureKind,
        message: String,
    },
    /// 执行成功但没有返回数据
    Empty {
        sql: String,
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        affected_rows: Option<u64>,
    },
    /// 执行成功并返回至少一行
    Succeeded { sql: String, result: QueryResult },
}

impl AskOutcome {
    /// 生成的 SQL（若已生成）
    pub fn sql(&self) -> Option<&str> {
        match self {
            AskOutcome::Idle | AskOutcome::GenerationFailed { .. } => None,
            AskOutcome::Rejected { sql, .. }
            | AskOutcome::ExecutionFailed { sql, .. }
            | AskOutcome::Empty { sql, .. }
            | AskOutcome::Succeeded { sql, .. } => Some(sql.as_str()),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            AskOutcome::Idle => "idle",
            AskOutcome::GenerationFailed { .. } => "generation_failed",
            AskOutcome::Rejected { .. } => "rejected",
            AskOutcome::ExecutionFailed { .. } => "execution_failed",
            AskOutcome::Empty { .. } => "empty",
            AskOutcome::Succeeded { .. } => "succeeded",
        }
    }

    fn from_execution(sql: String, executed: AppResult<QueryResult>) -> Self {
        match executed {
            Ok(result) if result.is_empty() => AskOutcome::Empty {
                sql,
                columns: result.columns.into_iter().map(|c| c.name).collect(),
                affected_rows: result.affected_rows,
            },
            Ok(result) => AskOutcome::Succeeded { sql, result },
            Err(AppError::UnsafeSql(reason)) => AskOutcome::Rejected { sql, reason },
            Err(e) => AskOutcome::ExecutionFailed {
                sql,
                kind: if e.is_database() {
                    FailureKind::Database
                } else {
                    FailureKind::Unexpected
                },
                message: e.to_string(),
            },
        }
    }
}

/// 编排器
#[derive(Clone)]
pub struct Orchestrator {
    generator: Arc<dyn SqlGenerator>,
    runner: Arc<dyn SqlRunner>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn SqlGenerator>, runner: Arc<dyn SqlRunner>) -> Self {
        Self { generator, runner }
    }

    /// 处理一次提问
    ///
    /// 所有错误都在这里转换为对应的状态，不会向上抛出。
    pub async fn ask(&self, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::Idle;
        }
        tracing::info!(question_len = question.len(), "收到提问");

        let sql = match self.generator.generate(question).await {
            Ok(sql) if !sql.trim().is_empty() => sql,
            Ok(_) => {
                tracing::warn!("生成结果为空");
                return AskOutcome::GenerationFailed {
                    message: AppError::Generation("model returned an empty query".into())
                        .to_string(),
                };
            }
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "SQL 生成失败");
                return AskOutcome::GenerationFailed {
                    message: e.to_string(),
                };
            }
        };

        let outcome = AskOutcome::from_execution(sql.clone(), self.runner.run(&sql).await);
        tracing::info!(state = outcome.state_name(), sql = %sql, "提问处理完成");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::query::ColumnInfo;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator {
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SqlGenerator for FixedGenerator {
        async fn generate(&self, _question: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|m| AppError::Generation(m.to_string()))
        }
    }

    struct FixedRunner {
        reply: fn() -> AppResult<QueryResult>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SqlRunner for FixedRunner {
        async fn run(&self, _sql: &str) -> AppResult<QueryResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn column(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: "TEXT".to_string(),
            nullable: None,
        }
    }

    fn one_row() -> AppResult<QueryResult> {
        Ok(QueryResult {
            columns: vec![column("City"), column("Total_Sales")],
            rows: vec![vec![json!("Delhi"), json!(750.5)]],
            row_count: 1,
            affected_rows: None,
            truncated: false,
            execution_time_ms: 1,
        })
    }

    fn no_rows() -> AppResult<QueryResult> {
        Ok(QueryResult {
            columns: vec![column("City")],
            ..QueryResult::empty()
        })
    }

    fn database_error() -> AppResult<QueryResult> {
        Err(AppError::DatabaseQuery("syntax error near SELEC".into()))
    }

    fn rejected() -> AppResult<QueryResult> {
        Err(AppError::UnsafeSql("only read-only queries are allowed, got DROP".into()))
    }

    fn unavailable() -> AppResult<QueryResult> {
        Err(AppError::ExternalService("connection refused".into()))
    }

    fn setup(
        generated: Result<&'static str, &'static str>,
        reply: fn() -> AppResult<QueryResult>,
    ) -> (Orchestrator, Arc<FixedGenerator>, Arc<FixedRunner>) {
        let generator = Arc::new(FixedGenerator {
            reply: generated,
            calls: AtomicUsize::new(0),
        });
        let runner = Arc::new(FixedRunner {
            reply,
            calls: AtomicUsize::new(0),
        });
        (
            Orchestrator::new(generator.clone(), runner.clone()),
            generator,
            runner,
        )
    }

    #[tokio::test]
    async fn test_blank_question_makes_no_calls() {
        let (orchestrator, generator, runner) = setup(Ok("SELECT 1"), one_row);

        for question in ["", "   ", "\n\t"] {
            assert_eq!(orchestrator.ask(question).await, AskOutcome::Idle);
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_execution() {
        let (orchestrator, _, runner) = setup(Err("quota exceeded"), one_row);

        let outcome = orchestrator.ask("sales per city").await;

        assert_eq!(
            outcome,
            AskOutcome::GenerationFailed {
                message: "Error generating SQL: quota exceeded".into()
            }
        );
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_generation_is_failure() {
        let (orchestrator, _, runner) = setup(Ok("  "), one_row);

        let outcome = orchestrator.ask("sales per city").await;

        assert!(matches!(outcome, AskOutcome::GenerationFailed { .. }));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rows_succeed() {
        let (orchestrator, _, _) = setup(Ok("SELECT City, SUM(Sales) AS Total_Sales"), one_row);

        let outcome = orchestrator.ask("Which city had the highest sales in 2024").await;

        match outcome {
            AskOutcome::Succeeded { sql, result } => {
                assert_eq!(sql, "SELECT City, SUM(Sales) AS Total_Sales");
                assert_eq!(result.column_names(), vec!["City", "Total_Sales"]);
                assert_eq!(result.rows.len(), 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_and_failed_are_distinct() {
        let (empty, _, _) = setup(Ok("SELECT City FROM sales_data WHERE 1 = 0"), no_rows);
        let (failed, _, _) = setup(Ok("SELEC 1"), database_error);

        let empty = empty.ask("nothing").await;
        let failed = failed.ask("broken").await;

        assert_eq!(
            empty,
            AskOutcome::Empty {
                sql: "SELECT City FROM sales_data WHERE 1 = 0".into(),
                columns: vec!["City".into()],
                affected_rows: None,
            }
        );
        assert_eq!(
            failed,
            AskOutcome::ExecutionFailed {
                sql: "SELEC 1".into(),
                kind: FailureKind::Database,
                message: "Database error: syntax error near SELEC".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_policy_rejection() {
        let (orchestrator, _, _) = setup(Ok("DROP TABLE sales_data"), rejected);

        let outcome = orchestrator.ask("drop it").await;

        assert_eq!(outcome.state_name(), "rejected");
        assert_eq!(outcome.sql(), Some("DROP TABLE sales_data"));
    }

    #[tokio::test]
    async fn test_other_failures_are_unexpected() {
        let (orchestrator, _, _) = setup(Ok("SELECT 1"), unavailable);

        let outcome = orchestrator.ask("anything").await;

        assert!(matches!(
            outcome,
            AskOutcome::ExecutionFailed {
                kind: FailureKind::Unexpected,
                ..
            }
        ));
    }

    #[test]
    fn test_outcome_serializes_with_state_tag() {
        let outcome = AskOutcome::Rejected {
            sql: "DROP TABLE t".into(),
            reason: "nope".into(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({ "state": "rejected", "sql": "DROP TABLE t", "reason": "nope" })
        );
        let back: AskOutcome = serde_json::from_value(value).unwrap();
        assert_eq!(back, outcome);
    }
}
