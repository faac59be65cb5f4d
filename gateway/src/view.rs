//! 页面渲染模块
//!
//! 服务端渲染单页：一个输入框、一个提交按钮，以及生成的 SQL、
//! 查询结果（或空结果提示）和错误提示三个展示区域。

use std::fmt::Write;

use serde_json::Value;

use common::models::query::QueryResult;

use crate::orchestrator::{AskOutcome, FailureKind};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
form { display: flex; gap: .5rem; margin-bottom: 1.5rem; }
input[type=text] { flex: 1; padding: .5rem; font-size: 1rem; }
button { padding: .5rem 1rem; font-size: 1rem; }
pre { background: #f5f5f5; padding: 1rem; overflow-x: auto; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: .4rem .6rem; text-align: left; }
th { background: #fafafa; }
.error { background: #fdecea; color: #611a15; padding: .75rem 1rem; }
.warning { background: #fff4e5; color: #663c00; padding: .75rem 1rem; }
.info { color: #555; font-size: .9rem; }
"#;

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_banner(out: &mut String, message: &str) {
    let _ = write!(out, r#"<div class="error" role="alert">{}</div>"#, escape_html(message));
}

fn warning_banner(out: &mut String, message: &str) {
    let _ = write!(out, r#"<div class="warning">{}</div>"#, escape_html(message));
}

fn sql_block(out: &mut String, sql: &str) {
    let _ = write!(
        out,
        r#"<h3>Generated SQL Query:</h3><pre><code class="language-sql">{}</code></pre>"#,
        escape_html(sql)
    );
}

/// 结果表格：表头为列名（保持查询顺序），每行一个 `<tr>`
pub fn render_table(result: &QueryResult) -> String {
    let mut out = String::from("<table><thead><tr>");
    for column in &result.columns {
        let _ = write!(out, "<th>{}</th>", escape_html(&column.name));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &result.rows {
        out.push_str("<tr>");
        for value in row {
            let _ = write!(out, "<td>{}</td>", escape_html(&cell_text(value)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    if result.truncated {
        let _ = write!(
            out,
            r#"<p class="info">Showing the first {} rows.</p>"#,
            result.rows.len()
        );
    }
    out
}

fn render_outcome(out: &mut String, outcome: &AskOutcome) {
    match outcome {
        AskOutcome::Idle => {}
        AskOutcome::GenerationFailed { message } => {
            error_banner(out, message);
            error_banner(out, "Failed to generate SQL query.");
        }
        AskOutcome::Rejected { sql, reason } => {
            sql_block(out, sql);
            error_banner(out, &format!("Query was not executed: {}", reason));
        }
        AskOutcome::ExecutionFailed { sql, kind, message } => {
            sql_block(out, sql);
            out.push_str("<h3>Query Results:</h3>");
            let label = match kind {
                FailureKind::Database => "The database could not run this query.",
                FailureKind::Unexpected => "The query could not be run.",
            };
            error_banner(out, message);
            warning_banner(out, label);
        }
        AskOutcome::Empty {
            sql, affected_rows, ..
        } => {
            sql_block(out, sql);
            out.push_str("<h3>Query Results:</h3>");
            match affected_rows {
                Some(n) => warning_banner(out, &format!("No data returned. {} row(s) affected.", n)),
                None => warning_banner(out, "No data returned."),
            }
        }
        AskOutcome::Succeeded { sql, result } => {
            sql_block(out, sql);
            out.push_str("<h3>Query Results:</h3>");
            out.push_str(&render_table(result));
        }
    }
}

/// 渲染完整页面
pub fn render_page(question: &str, outcome: &AskOutcome) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>SQL Assistant</title><style>{}</style></head>
<body>
<h1>Gemini SQL Query Generator</h1>
<form method="post" action="/ask">
<input type="text" name="question" placeholder="Ask your data question (in plain English)" value="{}" autofocus>
<button type="submit">Get SQL &amp; Run</button>
</form>
"#,
        STYLE,
        escape_html(question)
    );
    render_outcome(&mut out, outcome);
    out.push_str("\n</body>\n</html>\n");
    out
}
