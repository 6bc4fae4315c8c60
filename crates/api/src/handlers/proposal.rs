//! Handlers for layout change proposals.
//!
//! A proposal is a frozen copy of a merchant's edits. Geometry is checked
//! once here at submission (so obviously escaping edits are rejected
//! early) and again, authoritatively, when a draft version is created.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use atrium_core::error::CoreError;
use atrium_core::geometry;
use atrium_core::guard;
use atrium_core::types::DbId;
use atrium_db::models::proposal::{CreateProposal, ReviewProposalRequest, SubmitProposalRequest};
use atrium_db::repositories::proposal_repo::{ReviewOutcome, SubmitProposalOutcome};
use atrium_db::repositories::ProposalRepo;
use atrium_events::{event_types, GovernanceEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::area::{ensure_area_exists, parse_region};
use crate::middleware::rbac::{RequireAdmin, RequireMerchant};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/proposals
///
/// Submit a batch of edits for an area the merchant holds a live
/// permission on. The changes are frozen as-submitted.
pub async fn submit_proposal(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
    Json(input): Json<SubmitProposalRequest>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;

    if input.changes.is_empty() {
        return Err(CoreError::Validation("Proposal contains no changes".into()).into());
    }

    let area = ensure_area_exists(&state.pool, input.area_id).await?;
    let region = parse_region(&area)?;

    // Every placed object must target this area and stay inside it.
    for object in input.changes.placed_objects() {
        if object.area_id != area.id {
            return Err(CoreError::Validation(format!(
                "Object {} targets area {} but the proposal is for area {}",
                object.object_id, object.area_id, area.id
            ))
            .into());
        }
        geometry::validate_edit(&region, &object.bounds).map_err(CoreError::from)?;
    }

    let create = CreateProposal {
        area_id: area.id,
        mall_id: area.mall_id,
        merchant_id,
        description: input.description,
        changes: serde_json::to_value(&input.changes)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize changes: {e}")))?,
    };

    let proposal = match ProposalRepo::submit(&state.pool, &create, Utc::now()).await? {
        SubmitProposalOutcome::Submitted(proposal) => proposal,
        SubmitProposalOutcome::AreaNotFound => {
            return Err(CoreError::NotFound { entity: "Area", id: input.area_id }.into());
        }
        SubmitProposalOutcome::NoActivePermission => {
            return Err(CoreError::Forbidden(format!(
                "No active permission for area {}",
                input.area_id
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::PROPOSAL_SUBMITTED)
            .with_entity("layout_proposal", proposal.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "area_id": proposal.area_id })),
    );

    tracing::info!(
        merchant_id,
        proposal_id = proposal.id,
        area_id = proposal.area_id,
        "Layout proposal submitted"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: proposal })))
}

/// POST /api/v1/proposals/{proposal_id}/review
///
/// Resolve a PENDING_REVIEW proposal to APPROVED or REJECTED.
pub async fn review_proposal(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(proposal_id): Path<DbId>,
    Json(input): Json<ReviewProposalRequest>,
) -> AppResult<impl IntoResponse> {
    let proposal = match ProposalRepo::review(
        &state.pool,
        proposal_id,
        user.user_id,
        input.approve,
        input.comment.as_deref(),
    )
    .await?
    {
        ReviewOutcome::Reviewed(proposal) => proposal,
        ReviewOutcome::NotFound => {
            return Err(
                CoreError::NotFound { entity: "LayoutProposal", id: proposal_id }.into(),
            );
        }
        ReviewOutcome::AlreadyResolved { status } => {
            return Err(CoreError::InvalidState(format!(
                "Proposal {proposal_id} is already resolved (status {status})"
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::PROPOSAL_REVIEWED)
            .with_entity("layout_proposal", proposal.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "status": proposal.status })),
    );

    tracing::info!(
        reviewer_id = user.user_id,
        proposal_id = proposal.id,
        status = %proposal.status,
        "Layout proposal reviewed"
    );

    Ok(Json(DataResponse { data: proposal }))
}

/// GET /api/v1/proposals/mine
///
/// The calling merchant's proposals, newest first.
pub async fn list_my_proposals(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;
    let proposals = ProposalRepo::list_for_merchant(&state.pool, merchant_id).await?;
    Ok(Json(DataResponse { data: proposals }))
}

/// GET /api/v1/proposals/pending
///
/// The admin review queue, oldest first.
pub async fn list_pending_proposals(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let proposals = ProposalRepo::list_pending(&state.pool).await?;
    Ok(Json(DataResponse { data: proposals }))
}
