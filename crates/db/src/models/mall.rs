//! Mall and floor row models (spatial entity store).

use serde::Serialize;
use sqlx::FromRow;

use atrium_core::types::{DbId, Timestamp};

/// A row from the `malls` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mall {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Cached pointer to the ACTIVE layout version; advisory only.
    pub current_version_id: Option<DbId>,
    pub status: String,
    pub config: Option<serde_json::Value>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `floors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Floor {
    pub id: DbId,
    pub mall_id: DbId,
    pub name: String,
    pub level: i32,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
