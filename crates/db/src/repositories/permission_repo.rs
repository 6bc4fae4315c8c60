//! Repository for the `area_permissions` table -- the permission ledger.
//!
//! Grant and revoke are single transactions that also flip the area's
//! status and append their audit entries; the partial unique index
//! `uq_area_permissions_active` backs the one-ACTIVE-per-area invariant
//! against races that slip past the in-transaction checks.

use sqlx::{PgPool, Postgres, Transaction};

use atrium_core::audit::{actions, entities};
use atrium_core::status::{area_status, permission_status};
use atrium_core::types::{DbId, Timestamp};

use crate::models::audit::CreateAuditLog;
use crate::models::permission::{AreaPermission, CreatePermission};
use crate::repositories::AuditLogRepo;

/// Column list shared across `area_permissions` queries.
pub(crate) const COLUMNS: &str = "id, area_id, merchant_id, grant_type, status, granted_at, \
    expires_at, granted_by, revoked_at, revoked_by, revoke_reason, version, \
    created_at, updated_at";

/// Outcome of a direct grant.
#[derive(Debug)]
pub enum GrantOutcome {
    Granted(AreaPermission),
    AreaNotFound,
    /// The area is mid-workflow (PENDING) or already held.
    AreaNotLocked { status: String },
    /// An ACTIVE permission already exists for the area.
    ActiveExists,
}

/// Outcome of a revoke.
#[derive(Debug)]
pub enum RevokeOutcome {
    Revoked(AreaPermission),
    NotFound,
    NotActive { status: String },
    /// Optimistic-concurrency mismatch against the caller's snapshot.
    VersionConflict { actual: i32 },
}

/// Ledger operations for area permissions.
pub struct PermissionRepo;

impl PermissionRepo {
    /// Insert an ACTIVE permission inside an open transaction.
    ///
    /// Callers must hold the area row lock and have verified that no
    /// ACTIVE permission exists; the unique index is the backstop.
    pub(crate) async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreatePermission,
    ) -> Result<AreaPermission, sqlx::Error> {
        let query = format!(
            "INSERT INTO area_permissions
                (area_id, merchant_id, grant_type, granted_by, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AreaPermission>(&query)
            .bind(input.area_id)
            .bind(input.merchant_id)
            .bind(&input.grant_type)
            .bind(input.granted_by)
            .bind(input.expires_at)
            .fetch_one(&mut **tx)
            .await
    }

    /// Grant editing rights directly (no application), atomically marking
    /// the area AUTHORIZED.
    ///
    /// Requires the area to be LOCKED: granting over a PENDING area would
    /// orphan the in-flight application.
    pub async fn grant(
        pool: &PgPool,
        input: &CreatePermission,
    ) -> Result<GrantOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The area row lock serializes against the apply workflow.
        let current_status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM areas WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(input.area_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = current_status else {
            return Ok(GrantOutcome::AreaNotFound);
        };
        if status != area_status::LOCKED {
            return Ok(GrantOutcome::AreaNotLocked { status });
        }

        let active_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM area_permissions WHERE area_id = $1 AND status = 'ACTIVE')",
        )
        .bind(input.area_id)
        .fetch_one(&mut *tx)
        .await?;
        if active_exists {
            return Ok(GrantOutcome::ActiveExists);
        }

        let permission = Self::insert_tx(&mut tx, input).await?;

        sqlx::query(
            "UPDATE areas SET status = $2, merchant_id = $3, version = version + 1, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(input.area_id)
        .bind(area_status::AUTHORIZED)
        .bind(input.merchant_id)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(input.granted_by),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::PERMISSION_GRANT.to_string(),
                entity_type: entities::AREA_PERMISSION.to_string(),
                entity_id: permission.id,
                before_json: None,
                after_json: Some(serde_json::json!({
                    "status": permission.status,
                    "area_id": permission.area_id,
                    "merchant_id": permission.merchant_id,
                    "grant_type": permission.grant_type,
                    "expires_at": permission.expires_at,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(GrantOutcome::Granted(permission))
    }

    /// Revoke a permission, atomically re-locking the area. In-flight
    /// layout proposals for the area are left untouched; only future
    /// edits are blocked.
    pub async fn revoke(
        pool: &PgPool,
        permission_id: DbId,
        revoked_by: DbId,
        reason: &str,
        expected_version: Option<i32>,
    ) -> Result<RevokeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM area_permissions WHERE id = $1 FOR UPDATE");
        let permission = sqlx::query_as::<_, AreaPermission>(&query)
            .bind(permission_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(permission) = permission else {
            return Ok(RevokeOutcome::NotFound);
        };
        if permission.status != permission_status::ACTIVE {
            return Ok(RevokeOutcome::NotActive {
                status: permission.status,
            });
        }
        if let Some(expected) = expected_version {
            if permission.version != expected {
                return Ok(RevokeOutcome::VersionConflict {
                    actual: permission.version,
                });
            }
        }

        let query = format!(
            "UPDATE area_permissions \
             SET status = $2, revoked_at = NOW(), revoked_by = $3, revoke_reason = $4, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let revoked = sqlx::query_as::<_, AreaPermission>(&query)
            .bind(permission_id)
            .bind(permission_status::REVOKED)
            .bind(revoked_by)
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        // The area becomes re-appliable.
        sqlx::query(
            "UPDATE areas SET status = $2, merchant_id = NULL, version = version + 1, \
             updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(revoked.area_id)
        .bind(area_status::LOCKED)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(revoked_by),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::PERMISSION_REVOKE.to_string(),
                entity_type: entities::AREA_PERMISSION.to_string(),
                entity_id: revoked.id,
                before_json: Some(serde_json::json!({ "status": permission_status::ACTIVE })),
                after_json: Some(serde_json::json!({
                    "status": revoked.status,
                    "revoke_reason": reason,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(RevokeOutcome::Revoked(revoked))
    }

    /// Whether `merchant_id` currently holds editing rights over
    /// `area_id`.
    ///
    /// Applies lazy expiry: a stored ACTIVE row whose `expires_at` has
    /// elapsed counts as inactive here; the background sweep persists the
    /// EXPIRED transition later.
    pub async fn check_active(
        pool: &PgPool,
        area_id: DbId,
        merchant_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(\
                SELECT 1 FROM area_permissions \
                WHERE area_id = $1 AND merchant_id = $2 AND status = 'ACTIVE' \
                  AND (expires_at IS NULL OR expires_at > $3))",
        )
        .bind(area_id)
        .bind(merchant_id)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Find a permission by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AreaPermission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM area_permissions WHERE id = $1");
        sqlx::query_as::<_, AreaPermission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a merchant's live grants (lazy-expiry filtered), newest first.
    pub async fn list_active_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<AreaPermission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM area_permissions \
             WHERE merchant_id = $1 AND status = 'ACTIVE' \
               AND (expires_at IS NULL OR expires_at > $2) \
             ORDER BY granted_at DESC"
        );
        sqlx::query_as::<_, AreaPermission>(&query)
            .bind(merchant_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Persist the EXPIRED transition for every ACTIVE permission whose
    /// expiry has elapsed, re-locking the corresponding areas. Returns the
    /// number of permissions expired. Called by the periodic sweep.
    pub async fn expire_elapsed(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE area_permissions \
             SET status = $2, version = version + 1, updated_at = NOW() \
             WHERE status = $3 AND expires_at IS NOT NULL AND expires_at <= $1 \
             RETURNING {COLUMNS}"
        );
        let expired = sqlx::query_as::<_, AreaPermission>(&query)
            .bind(now)
            .bind(permission_status::EXPIRED)
            .bind(permission_status::ACTIVE)
            .fetch_all(&mut *tx)
            .await?;

        for permission in &expired {
            sqlx::query(
                "UPDATE areas SET status = $2, merchant_id = NULL, version = version + 1, \
                 updated_at = NOW() \
                 WHERE id = $1 AND status = $3 AND deleted_at IS NULL",
            )
            .bind(permission.area_id)
            .bind(area_status::LOCKED)
            .bind(area_status::AUTHORIZED)
            .execute(&mut *tx)
            .await?;

            AuditLogRepo::append_tx(
                &mut tx,
                &CreateAuditLog {
                    actor_id: None,
                    actor_role: None,
                    action: actions::PERMISSION_EXPIRE.to_string(),
                    entity_type: entities::AREA_PERMISSION.to_string(),
                    entity_id: permission.id,
                    before_json: Some(serde_json::json!({ "status": permission_status::ACTIVE })),
                    after_json: Some(serde_json::json!({
                        "status": permission_status::EXPIRED,
                        "expires_at": permission.expires_at,
                    })),
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(expired.len() as u64)
    }
}
