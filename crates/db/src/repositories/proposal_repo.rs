//! Repository for the `layout_proposals` table.
//!
//! Proposals are frozen copies of a merchant's edits. Submission requires
//! a live permission on the area; review is forward-only; MERGED is only
//! ever written by the publish transaction in `layout_repo`.

use sqlx::PgPool;

use atrium_core::audit::{actions, entities};
use atrium_core::status::proposal_status;
use atrium_core::types::{DbId, Timestamp};

use crate::models::audit::CreateAuditLog;
use crate::models::proposal::{CreateProposal, LayoutProposal};
use crate::repositories::AuditLogRepo;

/// Column list shared across `layout_proposals` queries.
pub(crate) const COLUMNS: &str = "id, area_id, mall_id, merchant_id, description, changes, \
    status, layout_version_id, reviewed_by, review_comment, submitted_at, reviewed_at, \
    created_at, updated_at";

/// Outcome of a proposal submission.
#[derive(Debug)]
pub enum SubmitProposalOutcome {
    Submitted(LayoutProposal),
    AreaNotFound,
    /// The merchant holds no live permission on the area.
    NoActivePermission,
}

/// Outcome of a proposal review.
#[derive(Debug)]
pub enum ReviewOutcome {
    Reviewed(LayoutProposal),
    NotFound,
    AlreadyResolved { status: String },
}

/// Operations for layout change proposals.
pub struct ProposalRepo;

impl ProposalRepo {
    /// Submit a proposal. The permission check runs inside the
    /// transaction so a concurrent revoke cannot slip a proposal in after
    /// the grant is gone.
    pub async fn submit(
        pool: &PgPool,
        input: &CreateProposal,
        now: Timestamp,
    ) -> Result<SubmitProposalOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let area_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM areas WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(input.area_id)
        .fetch_one(&mut *tx)
        .await?;
        if !area_exists {
            return Ok(SubmitProposalOutcome::AreaNotFound);
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(\
                SELECT 1 FROM area_permissions \
                WHERE area_id = $1 AND merchant_id = $2 AND status = 'ACTIVE' \
                  AND (expires_at IS NULL OR expires_at > $3))",
        )
        .bind(input.area_id)
        .bind(input.merchant_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        if !active {
            return Ok(SubmitProposalOutcome::NoActivePermission);
        }

        let query = format!(
            "INSERT INTO layout_proposals (area_id, mall_id, merchant_id, description, changes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let proposal = sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(input.area_id)
            .bind(input.mall_id)
            .bind(input.merchant_id)
            .bind(&input.description)
            .bind(&input.changes)
            .fetch_one(&mut *tx)
            .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(input.merchant_id),
                actor_role: Some(atrium_core::roles::ROLE_MERCHANT.to_string()),
                action: actions::PROPOSAL_SUBMIT.to_string(),
                entity_type: entities::LAYOUT_PROPOSAL.to_string(),
                entity_id: proposal.id,
                before_json: None,
                after_json: Some(serde_json::json!({
                    "status": proposal.status,
                    "area_id": proposal.area_id,
                })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(SubmitProposalOutcome::Submitted(proposal))
    }

    /// Resolve a PENDING_REVIEW proposal to APPROVED or REJECTED.
    pub async fn review(
        pool: &PgPool,
        proposal_id: DbId,
        reviewer_id: DbId,
        approve: bool,
        comment: Option<&str>,
    ) -> Result<ReviewOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM layout_proposals WHERE id = $1 FOR UPDATE");
        let proposal = sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(proposal_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(proposal) = proposal else {
            return Ok(ReviewOutcome::NotFound);
        };
        if proposal.status != proposal_status::PENDING_REVIEW {
            return Ok(ReviewOutcome::AlreadyResolved {
                status: proposal.status,
            });
        }

        let next_status = if approve {
            proposal_status::APPROVED
        } else {
            proposal_status::REJECTED
        };

        let query = format!(
            "UPDATE layout_proposals \
             SET status = $2, reviewed_by = $3, review_comment = $4, reviewed_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let reviewed = sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(proposal_id)
            .bind(next_status)
            .bind(reviewer_id)
            .bind(comment)
            .fetch_one(&mut *tx)
            .await?;

        AuditLogRepo::append_tx(
            &mut tx,
            &CreateAuditLog {
                actor_id: Some(reviewer_id),
                actor_role: Some(atrium_core::roles::ROLE_ADMIN.to_string()),
                action: actions::PROPOSAL_REVIEW.to_string(),
                entity_type: entities::LAYOUT_PROPOSAL.to_string(),
                entity_id: reviewed.id,
                before_json: Some(serde_json::json!({ "status": proposal_status::PENDING_REVIEW })),
                after_json: Some(serde_json::json!({ "status": reviewed.status })),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(ReviewOutcome::Reviewed(reviewed))
    }

    /// Find a proposal by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LayoutProposal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layout_proposals WHERE id = $1");
        sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a batch of proposals by id (order unspecified).
    pub async fn find_many(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<LayoutProposal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layout_proposals WHERE id = ANY($1)");
        sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List a merchant's proposals, newest first.
    pub async fn list_for_merchant(
        pool: &PgPool,
        merchant_id: DbId,
    ) -> Result<Vec<LayoutProposal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layout_proposals \
             WHERE merchant_id = $1 \
             ORDER BY submitted_at DESC"
        );
        sqlx::query_as::<_, LayoutProposal>(&query)
            .bind(merchant_id)
            .fetch_all(pool)
            .await
    }

    /// The admin review queue: PENDING_REVIEW proposals, oldest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<LayoutProposal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layout_proposals \
             WHERE status = 'PENDING_REVIEW' \
             ORDER BY submitted_at ASC"
        );
        sqlx::query_as::<_, LayoutProposal>(&query)
            .fetch_all(pool)
            .await
    }
}
