//! Database backend models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Database type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL database.
    MySQL,
    /// PostgreSQL database.
    Postgres,
    /// SQLite database.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL => Some(3306),
            DbType::Postgres => Some(5432),
            DbType::SQLite => None,
        }
    }

    /// Infers the backend from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self, AppError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            "sqlite" => Ok(DbType::SQLite),
            other => Err(AppError::Configuration(format!(
                "unsupported database URL scheme: {}",
                other
            ))),
        }
    }
}

impl std::str::FromStr for DbType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            "sqlite" => Ok(DbType::SQLite),
            other => Err(AppError::Configuration(format!(
                "unsupported DB_TYPE: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::Postgres => write!(f, "postgres"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}
