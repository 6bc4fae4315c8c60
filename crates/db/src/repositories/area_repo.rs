//! Repository for the `areas` table (spatial entity store).

use sqlx::PgPool;

use atrium_core::types::DbId;

use crate::models::area::{Area, AvailableArea};

/// Column list shared across `areas` queries.
pub(crate) const COLUMNS: &str = "id, floor_id, mall_id, name, area_type, geometry, status, \
    merchant_id, version, deleted_at, created_at, updated_at";

/// Read access and checked status writes for areas. Status transitions
/// driven by the governance workflow happen inside the apply/permission
/// repositories' transactions; this checked setter exists for structural
/// tooling (e.g. marking an area OCCUPIED when a store opens).
pub struct AreaRepo;

impl AreaRepo {
    /// Find an area by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Area>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM areas WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Area>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List appliable (LOCKED) areas joined with their floor, optionally
    /// filtered to one floor.
    pub async fn list_available(
        pool: &PgPool,
        floor_id: Option<DbId>,
    ) -> Result<Vec<AvailableArea>, sqlx::Error> {
        const AVAILABLE: &str = "SELECT a.id, a.name, a.area_type, a.floor_id, \
                f.name AS floor_name, a.status, a.geometry \
             FROM areas a \
             JOIN floors f ON f.id = a.floor_id \
             WHERE a.deleted_at IS NULL \
               AND f.deleted_at IS NULL \
               AND a.status = 'LOCKED'";

        match floor_id {
            Some(floor_id) => {
                let query = format!("{AVAILABLE} AND a.floor_id = $1 ORDER BY f.level, a.name");
                sqlx::query_as::<_, AvailableArea>(&query)
                    .bind(floor_id)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!("{AVAILABLE} ORDER BY f.level, a.name");
                sqlx::query_as::<_, AvailableArea>(&query)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Conditionally move an area from `from` to `to`. Returns `false`
    /// when the area was not in `from` (or does not exist) -- the caller
    /// decides whether that is an invalid state or a lost race.
    pub async fn set_status_checked(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE areas SET status = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
