//! 提示词构建模块
//!
//! 固定的指令模板描述目标表结构，并附带两个示例，
//! 与用户问题一起作为两段输入发送给模型。

/// 发给模型的固定指令
pub const INSTRUCTIONS: &str = r#"
You are a SQL expert. Convert the user's natural language request into a valid SQL query.
Assume the database is MySQL and there is a table called 'sales_data' with the following columns:
sale_date, Channel, Product_Name, City, Quantity, Sales.
Only return the SQL query. Do not include explanations or extra text.

Examples:
1. "Show total sales and quantity per city" means:
   SELECT City, SUM(Sales) AS Total_Sales, SUM(Quantity) AS Total_Quantity FROM sales_data GROUP BY City
2. "Which city had the highest sales in 2024" means:
   SELECT City, SUM(Sales) AS Total_Sales FROM sales_data WHERE sale_date BETWEEN '2024-01-01' AND '2024-12-31' GROUP BY City ORDER BY Total_Sales DESC LIMIT 1
"#;

/// 一次请求的完整提示词，构建后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    instructions: &'static str,
    question: String,
}

impl Prompt {
    /// 用固定指令和用户问题构建提示词
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            instructions: INSTRUCTIONS,
            question: question.into(),
        }
    }

    pub fn instructions(&self) -> &str {
        self.instructions
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// 按发送顺序返回两段输入：指令在前，问题在后
    pub fn parts(&self) -> [&str; 2] {
        [self.instructions, self.question.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_describe_schema() {
        for column in ["sale_date", "Channel", "Product_Name", "City", "Quantity", "Sales"] {
            assert!(INSTRUCTIONS.contains(column), "missing column {}", column);
        }
        assert!(INSTRUCTIONS.contains("sales_data"));
        assert!(INSTRUCTIONS.contains("Only return the SQL query"));
    }

    #[test]
    fn test_parts_order() {
        let prompt = Prompt::new("Show total sales per city");
        let [first, second] = prompt.parts();
        assert_eq!(first, INSTRUCTIONS);
        assert_eq!(second, "Show total sales per city");
        assert_eq!(prompt.question(), second);
    }
}
