//! 数据库连接池
//!
//! 启动时按配置的数据库类型建立一个连接池并注入执行器。
//! 每次查询借出一个连接，借出守卫释放时连接归还连接池。

use common::config::{AppConfig, DatabaseSettings};
use common::errors::{AppError, AppResult};
use common::models::connection::DbType;
use common::models::monitor::ConnectionPoolStats;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySqlPool, PgPool, SqlitePool};

/// 支持的数据库连接池
#[derive(Clone, Debug)]
pub enum DatabasePool {
    /// MySQL 连接池
    MySQL(MySqlPool),
    /// PostgreSQL 连接池
    Postgres(PgPool),
    /// SQLite 连接池
    SQLite(SqlitePool),
}

fn invalid_settings(e: sqlx::Error) -> AppError {
    AppError::Configuration(format!("invalid database settings: {}", e))
}

/// MySQL 连接参数，凭据不经过 URL 拼接
pub(crate) fn mysql_options(settings: &DatabaseSettings) -> AppResult<MySqlConnectOptions> {
    match &settings.url_override {
        Some(url) => url.parse().map_err(invalid_settings),
        None => Ok(MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database)),
    }
}

/// PostgreSQL 连接参数
pub(crate) fn pg_options(settings: &DatabaseSettings) -> AppResult<PgConnectOptions> {
    match &settings.url_override {
        Some(url) => url.parse().map_err(invalid_settings),
        None => Ok(PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database)),
    }
}

/// SQLite 连接参数，文件不存在时自动创建
pub(crate) fn sqlite_options(settings: &DatabaseSettings) -> AppResult<SqliteConnectOptions> {
    if let Some(url) = &settings.url_override {
        return url.parse().map_err(invalid_settings);
    }
    let path = settings
        .file_path
        .as_deref()
        .ok_or_else(|| AppError::Configuration("SQLite requires DB_FILE".into()))?;
    Ok(SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true))
}

impl DatabasePool {
    /// 按配置建立连接池
    ///
    /// 连接在首次借出时才真正建立，数据库不可达时表现为单次查询失败，
    /// 而不是启动失败。
    pub fn connect_lazy(config: &AppConfig, settings: &DatabaseSettings) -> AppResult<Self> {
        let timeout = config.acquire_timeout();
        let max_connections = config.max_connections.max(1);

        let pool = match settings.db_type {
            DbType::MySQL => DatabasePool::MySQL(
                MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_lazy_with(mysql_options(settings)?),
            ),
            DbType::Postgres => DatabasePool::Postgres(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_lazy_with(pg_options(settings)?),
            ),
            DbType::SQLite => DatabasePool::SQLite(
                SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_lazy_with(sqlite_options(settings)?),
            ),
        };

        tracing::info!(
            db_type = %settings.db_type,
            max_connections,
            "连接池已创建"
        );
        Ok(pool)
    }

    /// 连接池对应的数据库类型
    pub fn db_type(&self) -> DbType {
        match self {
            DatabasePool::MySQL(_) => DbType::MySQL,
            DatabasePool::Postgres(_) => DbType::Postgres,
            DatabasePool::SQLite(_) => DbType::SQLite,
        }
    }

    /// 当前连接池统计
    pub fn stats(&self) -> ConnectionPoolStats {
        let (size, idle, max_size, closed) = match self {
            DatabasePool::MySQL(p) => (p.size(), p.num_idle(), p.options().get_max_connections(), p.is_closed()),
            DatabasePool::Postgres(p) => (p.size(), p.num_idle(), p.options().get_max_connections(), p.is_closed()),
            DatabasePool::SQLite(p) => (p.size(), p.num_idle(), p.options().get_max_connections(), p.is_closed()),
        };
        let idle = idle as u32;
        ConnectionPoolStats {
            active: size.saturating_sub(idle),
            idle,
            max_size,
            is_connected: !closed,
        }
    }

    /// 关闭连接池中的所有连接
    pub async fn close(&self) {
        match self {
            DatabasePool::MySQL(p) => p.close().await,
            DatabasePool::Postgres(p) => p.close().await,
            DatabasePool::SQLite(p) => p.close().await,
        }
    }
}
