//! Shared data models for all microservices.

pub mod connection;
pub mod generation;
pub mod monitor;
pub mod query;

// Re-export commonly used types
pub use connection::DbType;
pub use generation::{GenerateRequest, GeneratedSql};
pub use monitor::ConnectionPoolStats;
pub use query::{ColumnInfo, QueryRequest, QueryResult};
