//! Repository for the `area_applies` table -- the application workflow.
//!
//! This is the only writer that moves an area LOCKED->PENDING->{AUTHORIZED,
//! LOCKED}. Each operation is one transaction that locks the governing
//! rows first: the area's status field acts as the submission mutex, so
//! when two merchants race to apply for the same area exactly one insert
//! wins and the loser observes the area already PENDING.

use sqlx::PgPool;

use atrium_core::audit::{actions, entities};
use atrium_core::status::{apply_status, area_status, grant_type, permission_status};
use atrium_core::types::{DbId, Timestamp};

use crate::models::apply::{AreaApply, CreateApply};
use crate::models::audit::CreateAuditLog;
use crate::models::permission::{AreaPermission, CreatePermission};
use crate::repositories::{AuditLogRepo, PermissionRepo};

/// Column list shared across `area_applies` queries.
const COLUMNS: &str = "id, area_id, merchant_id, reason, requested_duration_days, status, \
    reviewer_id, review_comment, reviewed_at, created_at, updated_at";

/// Outcome of a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(AreaApply),
    AreaNotFound,
    /// The area is not LOCKED -- taken, mid-review, or occupied.
    AreaNotLocked { status: String },
    /// A PENDING application already exists for the area.
    DuplicatePending,
}

/// Outcome of an approval.
#[derive(Debug)]
pub enum ApproveOutcome {
    Approved {
        apply: AreaApply,
        permission: AreaPermission,
    },
    NotFound,
    NotPending { status: String },
    /// The area vanished between submission and review.
    AreaNotFound,
    /// Defense in depth; the partial unique index is the backstop.
    ActivePermissionExists,
}

/// Outcome of a rejection.
#[derive(Debug)]
pub enum RejectOutcome {
    Rejected(AreaApply),
    NotFound,
    NotPending { status: String },
}

/// Workflow operations for area applications.
pub struct ApplyRepo;

impl ApplyRepo {
    /// Submit an application for a LOCKED area, atomically moving the
    /// area to PENDING.
    pub async fn submit(
        pool: &PgPool,
        input: &CreateApply,
    ) -> Result<SubmitOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Lock the area row; its status is the first-writer-wins mutex.
        let current_status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM areas WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(input.area_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = current_status else {
            return Ok(SubmitOutcome::AreaNotFound);
        };
        if status != area_status::LOCKED {
            return Ok(SubmitOutcome::AreaNotLocked { status });
        }

        // A LOCKED area should never carry a pending application; the
        // partial unique index catches anything that slips through.
        let pending_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM area_applies WHERE area_id = $1 AND status = 'PENDING')",
        )
        .bind(input.area_id)
        .fetch_one(&mut *tx)
        .await?;
        if pending_exists {
            return Ok(SubmitOutcome::DuplicatePending);
        }

        let query = format!(
            "INSERT INTO area_applies (area_id, merchant_id, reason, requested_duration_days)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let apply = sqlx::query_as::<_, AreaApply>(&query)
            .bind(input.area_id)
            .bind(input.merchant_id)
            .bind(&input.reason)
            .bind(input.requested_duration_days)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE areas SET status = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(input.area_id)
        .bind(area_status::PENDING)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(input.merchant_id),
                actor_role: Some(atrium_core::roles::ROLE_MERCHANT.to_string()),
                action: actions::APPLY_SUBMIT.to_string(),
                entity_type: entities::AREA_APPLY.to_string(),
                entity_id: apply.id,
                before_json: Some(serde_json::json!({ "area_status": area_status::LOCKED })),
                after_json: Some(serde_json::json!({
                    "status": apply.status,
                    "area_id": apply.area_id,
                    "area_status": area_status::PENDING,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(SubmitOutcome::Submitted(apply))
    }

    /// Approve a PENDING application: resolve it, grant the permission,
    /// and mark the area AUTHORIZED -- all or nothing.
    pub async fn approve(
        pool: &PgPool,
        apply_id: DbId,
        reviewer_id: DbId,
        comment: Option<&str>,
        expires_at: Option<Timestamp>,
    ) -> Result<ApproveOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM area_applies WHERE id = $1 FOR UPDATE");
        let apply = sqlx::query_as::<_, AreaApply>(&query)
            .bind(apply_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(apply) = apply else {
            return Ok(ApproveOutcome::NotFound);
        };
        if apply.status != apply_status::PENDING {
            return Ok(ApproveOutcome::NotPending {
                status: apply.status,
            });
        }

        // Lock the area before touching the permission ledger.
        let area_found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM areas WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(apply.area_id)
        .fetch_optional(&mut *tx)
        .await?;
        if area_found.is_none() {
            return Ok(ApproveOutcome::AreaNotFound);
        }

        let active_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM area_permissions WHERE area_id = $1 AND status = 'ACTIVE')",
        )
        .bind(apply.area_id)
        .fetch_one(&mut *tx)
        .await?;
        if active_exists {
            return Ok(ApproveOutcome::ActivePermissionExists);
        }

        let query = format!(
            "UPDATE area_applies \
             SET status = $2, reviewer_id = $3, review_comment = $4, reviewed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let resolved = sqlx::query_as::<_, AreaApply>(&query)
            .bind(apply_id)
            .bind(apply_status::APPROVED)
            .bind(reviewer_id)
            .bind(comment)
            .fetch_one(&mut *tx)
            .await?;

        let permission = PermissionRepo::insert_tx(
            &mut tx,
            &CreatePermission {
                area_id: apply.area_id,
                merchant_id: apply.merchant_id,
                grant_type: grant_type::ADMIN_APPROVAL.to_string(),
                granted_by: reviewer_id,
                expires_at,
            },
        )
        .await?;

        sqlx::query(
            "UPDATE areas SET status = $2, merchant_id = $3, version = version + 1, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(apply.area_id)
        .bind(area_status::AUTHORIZED)
        .bind(apply.merchant_id)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(reviewer_id),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::APPLY_APPROVE.to_string(),
                entity_type: entities::AREA_APPLY.to_string(),
                entity_id: resolved.id,
                before_json: Some(serde_json::json!({ "status": apply_status::PENDING })),
                after_json: Some(serde_json::json!({
                    "status": resolved.status,
                    "area_status": area_status::AUTHORIZED,
                })),
            },
        )
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(reviewer_id),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::PERMISSION_GRANT.to_string(),
                entity_type: entities::AREA_PERMISSION.to_string(),
                entity_id: permission.id,
                before_json: None,
                after_json: Some(serde_json::json!({
                    "status": permission_status::ACTIVE,
                    "area_id": permission.area_id,
                    "merchant_id": permission.merchant_id,
                    "expires_at": permission.expires_at,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(ApproveOutcome::Approved {
            apply: resolved,
            permission,
        })
    }

    /// Reject a PENDING application, returning the area to LOCKED.
    pub async fn reject(
        pool: &PgPool,
        apply_id: DbId,
        reviewer_id: DbId,
        reason: &str,
    ) -> Result<RejectOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM area_applies WHERE id = $1 FOR UPDATE");
        let apply = sqlx::query_as::<_, AreaApply>(&query)
            .bind(apply_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(apply) = apply else {
            return Ok(RejectOutcome::NotFound);
        };
        if apply.status != apply_status::PENDING {
            return Ok(RejectOutcome::NotPending {
                status: apply.status,
            });
        }

        let query = format!(
            "UPDATE area_applies \
             SET status = $2, reviewer_id = $3, review_comment = $4, reviewed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let resolved = sqlx::query_as::<_, AreaApply>(&query)
            .bind(apply_id)
            .bind(apply_status::REJECTED)
            .bind(reviewer_id)
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        // The rejected area becomes appliable again.
        sqlx::query(
            "UPDATE areas SET status = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND status = $3 AND deleted_at IS NULL",
        )
        .bind(apply.area_id)
        .bind(area_status::LOCKED)
        .bind(area_status::PENDING)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(reviewer_id),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::APPLY_REJECT.to_string(),
                entity_type: entities::AREA_APPLY.to_string(),
                entity_id: resolved.id,
                before_json: Some(serde_json::json!({ "status": apply_status::PENDING })),
                after_json: Some(serde_json::json!({
                    "status": resolved.status,
                    "reason": reason,
                    "area_status": area_status::LOCKED,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(RejectOutcome::Rejected(resolved))
    }

    /// Find an application by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AreaApply>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM area_applies WHERE id = $1");
        sqlx::query_as::<_, AreaApply>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a merchant's applications, newest first.
    pub async fn list_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Vec<AreaApply>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM area_applies \
             WHERE merchant_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, AreaApply>(&query)
            .bind(merchant_id)
            .fetch_all(pool)
            .await
    }

    /// The admin review queue: PENDING applications, oldest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<AreaApply>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM area_applies \
             WHERE status = 'PENDING' \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, AreaApply>(&query).fetch_all(pool).await
    }
}
