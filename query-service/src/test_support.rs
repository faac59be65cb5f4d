//! SQLite-backed `sales_data` fixture for unit tests.

use common::config::{AppConfig, DatabaseSettings};
use common::errors::AppResult;
use tempfile::TempDir;

use crate::pool::DatabasePool;

pub const HIGHEST_CITY_2024: &str = "SELECT City, SUM(Sales) AS Total_Sales FROM sales_data \
     WHERE sale_date BETWEEN '2024-01-01' AND '2024-12-31' \
     GROUP BY City ORDER BY Total_Sales DESC LIMIT 1";

const SCHEMA: &str = "CREATE TABLE sales_data (
    sale_date TEXT NOT NULL,
    Channel TEXT NOT NULL,
    Product_Name TEXT NOT NULL,
    City TEXT NOT NULL,
    Quantity INTEGER NOT NULL,
    Sales REAL NOT NULL
)";

const ROWS: &str = "INSERT INTO sales_data VALUES
    ('2024-01-15', 'Online', 'Widget', 'Mumbai', 3, 300.0),
    ('2024-02-10', 'Retail', 'Gadget', 'Delhi', 5, 750.5),
    ('2024-03-05', 'Online', 'Gadget', 'Mumbai', 2, 300.0),
    ('2023-12-30', 'Retail', 'Widget', 'Delhi', 10, 5000.0),
    ('2024-06-20', 'Retail', 'Widget', 'Pune', 1, 100.0)";

/// Config and settings for a SQLite file inside `dir`.
pub fn sqlite_config(dir: &TempDir, max_connections: u32) -> AppResult<(AppConfig, DatabaseSettings)> {
    let file = dir.path().join("sales.db").display().to_string();
    let max = max_connections.to_string();
    let lookup = move |key: &str| match key {
        "DB_TYPE" => Some("sqlite".to_string()),
        "DB_FILE" => Some(file.clone()),
        "DB_MAX_CONNECTIONS" => Some(max.clone()),
        "DB_ACQUIRE_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    };
    let config = AppConfig::from_lookup("query-service", 0, &lookup);
    let settings = DatabaseSettings::from_lookup(&lookup)?;
    Ok((config, settings))
}

/// Builds a pool of `max_connections` over a freshly seeded `sales_data` table.
///
/// The returned directory must outlive the pool.
pub async fn sales_pool(max_connections: u32) -> (TempDir, DatabasePool) {
    let dir = tempfile::tempdir().unwrap();
    let (config, settings) = sqlite_config(&dir, max_connections).unwrap();
    let pool = DatabasePool::connect_lazy(&config, &settings).unwrap();

    let DatabasePool::SQLite(sqlite) = &pool else {
        panic!("expected a SQLite pool");
    };
    sqlx::query(SCHEMA).execute(sqlite).await.unwrap();
    sqlx::query(ROWS).execute(sqlite).await.unwrap();

    (dir, pool)
}
