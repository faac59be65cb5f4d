//! 查询生成模块
//!
//! 将用户问题与固定提示词一起发给模型，并把返回文本清理成一条 SQL。

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::generation::GeneratedSql;

use crate::llm::LlmClient;
use crate::prompt::Prompt;

/// 去掉模型输出中的 Markdown 代码块标记
///
/// 标记出现在任何位置都会被移除，不只是首尾。对已经干净的文本不做改动。
pub fn clean_generated_sql(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// SQL 生成器
#[derive(Clone)]
pub struct QueryGenerator {
    llm: Arc<dyn LlmClient>,
}

impl QueryGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// 根据自然语言问题生成 SQL
    ///
    /// # Errors
    /// 问题为空时返回 `Validation`；模型调用失败或清理后为空时返回 `Generation`。
    pub async fn generate(&self, question: &str) -> AppResult<GeneratedSql> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question is required".into()));
        }

        tracing::info!(question_len = question.len(), model = self.model(), "开始生成 SQL");

        let prompt = Prompt::new(question);
        let raw = self.llm.generate_content(&prompt.parts()).await?;
        let sql = clean_generated_sql(&raw);

        if sql.is_empty() {
            tracing::warn!(raw_length = raw.len(), "模型返回内容清理后为空");
            return Err(AppError::Generation("model returned an empty query".into()));
        }

        tracing::info!(sql = %sql, "SQL 生成完成");
        Ok(GeneratedSql {
            sql,
            model: self.model().to_string(),
            raw_length: raw.len(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 返回固定结果的模型替身，记录收到的输入
    pub(crate) struct FakeLlm {
        reply: AppResult<String>,
        pub(crate) calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeLlm {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(AppError::Generation(message.to_string())),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlm {
        async fn generate_content(&self, parts: &[&str]) -> AppResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push(parts.iter().map(|p| p.to_string()).collect());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AppError::Generation(e.message().to_string())),
            }
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    #[test]
    fn test_clean_strips_sql_fence() {
        assert_eq!(clean_generated_sql("```sql\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_clean_strips_fences_anywhere() {
        assert_eq!(
            clean_generated_sql("  Here:\n```sql\nSELECT City FROM sales_data\n``` "),
            "Here:\n\nSELECT City FROM sales_data"
        );
        assert_eq!(clean_generated_sql("```\nSELECT 2\n```"), "SELECT 2");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let inputs = [
            "SELECT 1",
            "```sql\nSELECT 1\n```",
            "  SELECT City, SUM(Sales) AS Total_Sales FROM sales_data GROUP BY City  ",
            "```",
            "",
        ];
        for input in inputs {
            let once = clean_generated_sql(input);
            assert_eq!(clean_generated_sql(&once), once);
        }
        assert_eq!(clean_generated_sql("SELECT 1"), "SELECT 1");
    }

    #[tokio::test]
    async fn test_generate_sends_instructions_then_question() {
        let llm = Arc::new(FakeLlm::replying("```sql\nSELECT 1\n```"));
        let generator = QueryGenerator::new(llm.clone());

        let generated = generator.generate("  count rows ").await.unwrap();

        assert_eq!(generated.sql, "SELECT 1");
        assert_eq!(generated.model, "fake-model");
        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], crate::prompt::INSTRUCTIONS);
        assert_eq!(calls[0][1], "count rows");
    }

    #[tokio::test]
    async fn test_blank_question_never_calls_model() {
        let llm = Arc::new(FakeLlm::replying("SELECT 1"));
        let generator = QueryGenerator::new(llm.clone());

        let err = generator.generate("   ").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fence_only_reply_is_generation_error() {
        let generator = QueryGenerator::new(Arc::new(FakeLlm::replying("```sql\n```")));
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn test_model_failure_is_passed_through() {
        let generator = QueryGenerator::new(Arc::new(FakeLlm::failing("quota exceeded")));
        let err = generator.generate("anything").await.unwrap_err();
        assert_eq!(err.to_string(), "Error generating SQL: quota exceeded");
    }
}
