//! Connection pool monitoring models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Connection pool statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionPoolStats {
    /// Number of active (in-use) connections.
    pub active: u32,
    /// Number of idle connections.
    pub idle: u32,
    /// Maximum pool size configured.
    pub max_size: u32,
    /// Whether the pool is still open.
    pub is_connected: bool,
}
