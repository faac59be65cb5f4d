//! 行数据解码
//!
//! 按驱动报告的 SQL 类型名把列值转换为 JSON，类型名未知时依次尝试常见类型，
//! 无法解码的值记为 `null`。

use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::BigDecimal;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use common::models::query::ColumnInfo;

/// 结果列描述
pub fn column_info<C: Column>(column: &C) -> ColumnInfo {
    ColumnInfo {
        name: column.name().to_string(),
        data_type: column.type_info().name().to_string(),
        nullable: None,
    }
}

/// 十进制数能表示为 JSON 数字时输出数字，否则输出字符串
fn decimal(value: BigDecimal) -> Value {
    let text = value.to_string();
    serde_json::from_str::<serde_json::Number>(&text)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

fn float(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn mysql_value(row: &MySqlRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        "TINYINT" => row.try_get::<i8, _>(idx).ok().map(Value::from),
        "SMALLINT" => row.try_get::<i16, _>(idx).ok().map(Value::from),
        "INT" | "MEDIUMINT" => row.try_get::<i32, _>(idx).ok().map(Value::from),
        "BIGINT" => row.try_get::<i64, _>(idx).ok().map(Value::from),
        "TINYINT UNSIGNED" => row.try_get::<u8, _>(idx).ok().map(Value::from),
        "SMALLINT UNSIGNED" => row.try_get::<u16, _>(idx).ok().map(Value::from),
        "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => row.try_get::<u32, _>(idx).ok().map(Value::from),
        "BIGINT UNSIGNED" => row.try_get::<u64, _>(idx).ok().map(Value::from),
        "FLOAT" => row.try_get::<f32, _>(idx).ok().map(|v| float(v as f64)),
        "DOUBLE" => row.try_get::<f64, _>(idx).ok().map(float),
        "DECIMAL" => row.try_get::<BigDecimal, _>(idx).ok().map(decimal),
        "DATE" => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "DATETIME" => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<DateTime<Utc>, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_rfc3339())),
        "JSON" => row.try_get::<Value, _>(idx).ok(),
        _ => None,
    };

    decoded
        .or_else(|| row.try_get::<String, _>(idx).ok().map(Value::String))
        .or_else(|| row.try_get::<i64, _>(idx).ok().map(Value::from))
        .or_else(|| row.try_get::<f64, _>(idx).ok().map(float))
        .or_else(|| row.try_get_unchecked::<String, _>(idx).ok().map(Value::String))
        .unwrap_or(Value::Null)
}

pub fn postgres_value(row: &PgRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "BOOL" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        "INT2" => row.try_get::<i16, _>(idx).ok().map(Value::from),
        "INT4" => row.try_get::<i32, _>(idx).ok().map(Value::from),
        "INT8" => row.try_get::<i64, _>(idx).ok().map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(idx).ok().map(|v| float(v as f64)),
        "FLOAT8" => row.try_get::<f64, _>(idx).ok().map(float),
        "NUMERIC" => row.try_get::<BigDecimal, _>(idx).ok().map(decimal),
        "DATE" => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_rfc3339())),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx).ok(),
        _ => None,
    };

    decoded
        .or_else(|| row.try_get::<String, _>(idx).ok().map(Value::String))
        .or_else(|| row.try_get::<i64, _>(idx).ok().map(Value::from))
        .or_else(|| row.try_get::<f64, _>(idx).ok().map(float))
        .unwrap_or(Value::Null)
}

pub fn sqlite_value(row: &SqliteRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INTEGER" => row.try_get::<i64, _>(idx).ok().map(Value::from),
        "REAL" => row.try_get::<f64, _>(idx).ok().map(float),
        "BOOLEAN" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        "TEXT" | "DATE" | "DATETIME" | "TIME" => {
            row.try_get::<String, _>(idx).ok().map(Value::String)
        }
        _ => None,
    };

    decoded
        .or_else(|| row.try_get::<String, _>(idx).ok().map(Value::String))
        .or_else(|| row.try_get::<i64, _>(idx).ok().map(Value::from))
        .or_else(|| row.try_get::<f64, _>(idx).ok().map(float))
        .unwrap_or(Value::Null)
}
