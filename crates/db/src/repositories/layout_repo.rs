//! Repository for the `layout_versions` table -- the version manager.
//!
//! Publish is the most safety-critical operation in the engine: archive
//! the previous ACTIVE version, promote the target, mark the collected
//! proposals MERGED, and refresh the mall's cached pointer, all in one
//! transaction. The mall row is locked first so concurrent publishes for
//! the same mall serialize; `uq_layout_versions_active` is the storage-
//! level backstop for the single-ACTIVE invariant.

use sqlx::{PgPool, Postgres, Transaction};

use atrium_core::audit::{actions, entities};
use atrium_core::status::{proposal_status, version_status};
use atrium_core::types::DbId;

use crate::models::audit::CreateAuditLog;
use crate::models::layout::{CreateVersion, LayoutVersion};
use crate::repositories::AuditLogRepo;

/// Column list shared across `layout_versions` queries.
const COLUMNS: &str = "id, mall_id, version_number, status, snapshot, description, \
    created_by, created_by_role, published_at, version, created_at, updated_at";

/// Outcome of draft creation.
#[derive(Debug)]
pub enum DraftOutcome {
    Created(LayoutVersion),
    MallNotFound,
    ProposalNotFound { id: DbId },
    /// Only APPROVED proposals may be collected into a draft.
    ProposalNotApproved { id: DbId, status: String },
    /// The proposal already belongs to another draft.
    ProposalAlreadyCollected { id: DbId },
    /// The proposal targets a different mall.
    ProposalWrongMall { id: DbId },
}

/// Outcome of a publish.
#[derive(Debug)]
pub enum PublishOutcome {
    Published {
        version: LayoutVersion,
        /// The previously ACTIVE version demoted by this publish, if any.
        archived_id: Option<DbId>,
    },
    NotFound,
    NotDraft { status: String },
    /// Optimistic-concurrency mismatch against the caller's snapshot.
    VersionConflict { actual: i32 },
}

/// Outcome of a rollback.
#[derive(Debug)]
pub enum RollbackOutcome {
    RolledBack {
        version: LayoutVersion,
        archived_id: Option<DbId>,
    },
    MallNotFound,
    TargetNotFound,
    /// Rolling back to an unpublished draft makes no sense.
    TargetIsDraft,
}

/// Version lifecycle operations.
pub struct LayoutVersionRepo;

impl LayoutVersionRepo {
    /// Create a DRAFT version from a set of APPROVED proposals.
    ///
    /// The caller composes (and boundary-validates) the snapshot from the
    /// proposals' frozen deltas; this transaction re-checks every
    /// proposal's status under lock, assigns the next version number, and
    /// attaches the proposals to the new draft.
    pub async fn create_draft(
        pool: &PgPool,
        input: &CreateVersion,
        proposal_ids: &[DbId],
    ) -> Result<DraftOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The mall row lock serializes version numbering per mall.
        let mall_found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM malls WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(input.mall_id)
        .fetch_optional(&mut *tx)
        .await?;
        if mall_found.is_none() {
            return Ok(DraftOutcome::MallNotFound);
        }

        let rows: Vec<(DbId, DbId, String, Option<DbId>)> = sqlx::query_as(
            "SELECT id, mall_id, status, layout_version_id FROM layout_proposals \
             WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(proposal_ids)
        .fetch_all(&mut *tx)
        .await?;

        for &id in proposal_ids {
            let Some((_, mall_id, status, attached)) = rows.iter().find(|r| r.0 == id) else {
                return Ok(DraftOutcome::ProposalNotFound { id });
            };
            if *mall_id != input.mall_id {
                return Ok(DraftOutcome::ProposalWrongMall { id });
            }
            if status != proposal_status::APPROVED {
                return Ok(DraftOutcome::ProposalNotApproved {
                    id,
                    status: status.clone(),
                });
            }
            if attached.is_some() {
                return Ok(DraftOutcome::ProposalAlreadyCollected { id });
            }
        }

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM layout_versions WHERE mall_id = $1",
        )
        .bind(input.mall_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO layout_versions
                (mall_id, version_number, snapshot, description, created_by, created_by_role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let draft = sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(input.mall_id)
            .bind(next_number)
            .bind(&input.snapshot)
            .bind(&input.description)
            .bind(input.created_by)
            .bind(&input.created_by_role)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE layout_proposals SET layout_version_id = $1, updated_at = NOW() \
             WHERE id = ANY($2)",
        )
        .bind(draft.id)
        .bind(proposal_ids)
        .execute(&mut *tx)
        .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(input.created_by),
                actor_role: Some(input.created_by_role.clone()),
                action: actions::VERSION_DRAFT.to_string(),
                entity_type: entities::LAYOUT_VERSION.to_string(),
                entity_id: draft.id,
                before_json: None,
                after_json: Some(serde_json::json!({
                    "status": draft.status,
                    "version_number": draft.version_number,
                    "proposal_ids": proposal_ids,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(DraftOutcome::Created(draft))
    }

    /// Publish a DRAFT version, atomically demoting the previous ACTIVE
    /// one. On any failure the transaction rolls back and the prior
    /// ACTIVE version is untouched.
    pub async fn publish(
        pool: &PgPool,
        version_id: DbId,
        published_by: DbId,
        expected_version: Option<i32>,
    ) -> Result<PublishOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM layout_versions WHERE id = $1 FOR UPDATE");
        let target = sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(version_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(target) = target else {
            return Ok(PublishOutcome::NotFound);
        };
        if target.status != version_status::DRAFT {
            return Ok(PublishOutcome::NotDraft {
                status: target.status,
            });
        }
        if let Some(expected) = expected_version {
            if target.version != expected {
                return Ok(PublishOutcome::VersionConflict {
                    actual: target.version,
                });
            }
        }

        let (version, archived_id) =
            promote_tx(&mut tx, target.id, target.mall_id).await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(published_by),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::VERSION_PUBLISH.to_string(),
                entity_type: entities::LAYOUT_VERSION.to_string(),
                entity_id: version.id,
                before_json: Some(serde_json::json!({ "status": version_status::DRAFT })),
                after_json: Some(serde_json::json!({
                    "status": version.status,
                    "version_number": version.version_number,
                    "archived_version_id": archived_id,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(PublishOutcome::Published {
            version,
            archived_id,
        })
    }

    /// Roll a mall back to an earlier snapshot by cloning it into a new
    /// version and publishing that clone. History is never mutated.
    pub async fn rollback(
        pool: &PgPool,
        mall_id: DbId,
        target_version_id: DbId,
        actor_id: DbId,
        actor_role: &str,
    ) -> Result<RollbackOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mall_found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM malls WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(mall_id)
        .fetch_optional(&mut *tx)
        .await?;
        if mall_found.is_none() {
            return Ok(RollbackOutcome::MallNotFound);
        }

        let query = format!(
            "SELECT {COLUMNS} FROM layout_versions WHERE id = $1 AND mall_id = $2 FOR UPDATE"
        );
        let target = sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(target_version_id)
            .bind(mall_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(target) = target else {
            return Ok(RollbackOutcome::TargetNotFound);
        };
        if target.status == version_status::DRAFT {
            return Ok(RollbackOutcome::TargetIsDraft);
        }

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 FROM layout_versions WHERE mall_id = $1",
        )
        .bind(mall_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO layout_versions
                (mall_id, version_number, snapshot, description, created_by, created_by_role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let clone = sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(mall_id)
            .bind(next_number)
            .bind(&target.snapshot)
            .bind(format!("Rollback to version {}", target.version_number))
            .bind(actor_id)
            .bind(actor_role)
            .fetch_one(&mut *tx)
            .await?;

        let (version, archived_id) = promote_tx(&mut tx, clone.id, mall_id).await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(actor_id),
                actor_role: Some(actor_role.to_string()),
                action: actions::VERSION_ROLLBACK.to_string(),
                entity_type: entities::LAYOUT_VERSION.to_string(),
                entity_id: version.id,
                before_json: Some(serde_json::json!({
                    "rolled_back_from": archived_id,
                })),
                after_json: Some(serde_json::json!({
                    "status": version.status,
                    "version_number": version.version_number,
                    "cloned_from": target.id,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(RollbackOutcome::RolledBack {
            version,
            archived_id,
        })
    }

    /// The mall's currently ACTIVE version, resolved through the partial
    /// unique index rather than the cached pointer. Logs a warning when
    /// the pointer disagrees.
    pub async fn find_active(
        pool: &PgPool,
        mall_id: DbId,
    ) -> Result<Option<LayoutVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layout_versions WHERE mall_id = $1 AND status = 'ACTIVE'"
        );
        let active = sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(mall_id)
            .fetch_optional(pool)
            .await?;

        if let Some(ref version) = active {
            let pointer: Option<Option<DbId>> = sqlx::query_scalar(
                "SELECT current_version_id FROM malls WHERE id = $1",
            )
            .bind(mall_id)
            .fetch_optional(pool)
            .await?;
            if let Some(pointer) = pointer.flatten() {
                if pointer != version.id {
                    tracing::warn!(
                        mall_id,
                        pointer,
                        active_id = version.id,
                        "Mall current_version_id disagrees with the ACTIVE version"
                    );
                }
            }
        }

        Ok(active)
    }

    /// Find a version by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LayoutVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layout_versions WHERE id = $1");
        sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Version history for a mall, newest first.
    pub async fn list_for_mall(
        pool: &PgPool,
        mall_id: DbId,
    ) -> Result<Vec<LayoutVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layout_versions \
             WHERE mall_id = $1 \
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, LayoutVersion>(&query)
            .bind(mall_id)
            .fetch_all(pool)
            .await
    }
}

/// Promote `version_id` to ACTIVE inside an open transaction: archive the
/// previous ACTIVE version, set `published_at`, mark the attached
/// APPROVED proposals MERGED, and refresh the mall's cached pointer.
///
/// The archive statement runs before the promote so the partial unique
/// index never sees two ACTIVE rows, even transiently.
async fn promote_tx(
    tx: &mut Transaction<'_, Postgres>,
    version_id: DbId,
    mall_id: DbId,
) -> Result<(LayoutVersion, Option<DbId>), sqlx::Error> {
    let archived_id: Option<DbId> = sqlx::query_scalar(
        "UPDATE layout_versions \
         SET status = $3, version = version + 1, updated_at = NOW() \
         WHERE mall_id = $1 AND status = 'ACTIVE' AND id <> $2 \
         RETURNING id",
    )
    .bind(mall_id)
    .bind(version_id)
    .bind(version_status::ARCHIVED)
    .fetch_optional(&mut **tx)
    .await?;

    let query = format!(
        "UPDATE layout_versions \
         SET status = $2, published_at = NOW(), version = version + 1, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    );
    let promoted = sqlx::query_as::<_, LayoutVersion>(&query)
        .bind(version_id)
        .bind(version_status::ACTIVE)
        .fetch_one(&mut **tx)
        .await?;

    sqlx::query(
        "UPDATE layout_proposals \
         SET status = $2, updated_at = NOW() \
         WHERE layout_version_id = $1 AND status = $3",
    )
    .bind(version_id)
    .bind(proposal_status::MERGED)
    .bind(proposal_status::APPROVED)
    .execute(&mut **tx)
    .await?;

    sqlx::query("UPDATE malls SET current_version_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(mall_id)
        .bind(version_id)
        .execute(&mut **tx)
        .await?;

    Ok((promoted, archived_id))
}
