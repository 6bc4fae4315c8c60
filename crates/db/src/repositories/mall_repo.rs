//! Repository for the `malls` and `floors` tables.

use sqlx::PgPool;

use atrium_core::types::DbId;

use crate::models::mall::{Floor, Mall};

/// Column list for `malls` queries.
const MALL_COLUMNS: &str = "id, name, description, current_version_id, status, config, \
    deleted_at, created_at, updated_at";

/// Column list for `floors` queries.
const FLOOR_COLUMNS: &str = "id, mall_id, name, level, deleted_at, created_at, updated_at";

/// Read operations for the mall structure. Structural writes (creating
/// malls, floors, areas) belong to the admin builder tooling, not the
/// governance engine.
pub struct MallRepo;

impl MallRepo {
    /// Find a mall by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Mall>, sqlx::Error> {
        let query = format!("SELECT {MALL_COLUMNS} FROM malls WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Mall>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a mall's floors ordered by level.
    pub async fn list_floors(pool: &PgPool, mall_id: DbId) -> Result<Vec<Floor>, sqlx::Error> {
        let query = format!(
            "SELECT {FLOOR_COLUMNS} FROM floors \
             WHERE mall_id = $1 AND deleted_at IS NULL \
             ORDER BY level ASC"
        );
        sqlx::query_as::<_, Floor>(&query)
            .bind(mall_id)
            .fetch_all(pool)
            .await
    }
}
