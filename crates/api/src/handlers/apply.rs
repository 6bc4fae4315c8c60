//! Handlers for the area application workflow.
//!
//! Merchants submit applications for LOCKED areas; admins resolve them.
//! All state transitions happen inside the repository transactions -- the
//! handlers translate outcomes onto the error taxonomy and publish the
//! matching governance events after commit.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use atrium_core::error::CoreError;
use atrium_core::guard;
use atrium_core::types::DbId;
use atrium_db::models::apply::{
    ApproveApplyRequest, AreaApply, CreateApply, RejectApplyRequest, SubmitApplyRequest,
};
use atrium_db::models::permission::AreaPermission;
use atrium_db::repositories::apply_repo::{ApproveOutcome, RejectOutcome, SubmitOutcome};
use atrium_db::repositories::ApplyRepo;
use atrium_events::{event_types, GovernanceEvent};

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireMerchant};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response body for an approval: the resolved application plus the
/// permission it produced.
#[derive(Debug, Serialize)]
pub struct ApprovalGrant {
    pub apply: AreaApply,
    pub permission: AreaPermission,
}

/// POST /api/v1/applies
///
/// Submit an application for a LOCKED area. The area moves to PENDING in
/// the same transaction; when two merchants race, exactly one submission
/// wins.
pub async fn submit_apply(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
    Json(input): Json<SubmitApplyRequest>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;

    if input.reason.trim().is_empty() {
        return Err(CoreError::Validation("Application reason must not be empty".into()).into());
    }
    if let Some(days) = input.requested_duration_days {
        if days <= 0 {
            return Err(
                CoreError::Validation("requested_duration_days must be positive".into()).into(),
            );
        }
    }

    let create = CreateApply {
        area_id: input.area_id,
        merchant_id,
        reason: input.reason,
        requested_duration_days: input.requested_duration_days,
    };

    let apply = match ApplyRepo::submit(&state.pool, &create).await? {
        SubmitOutcome::Submitted(apply) => apply,
        SubmitOutcome::AreaNotFound => {
            return Err(CoreError::NotFound { entity: "Area", id: input.area_id }.into());
        }
        SubmitOutcome::AreaNotLocked { status } => {
            return Err(CoreError::InvalidState(format!(
                "Area {} cannot be applied for in status {status}",
                input.area_id
            ))
            .into());
        }
        SubmitOutcome::DuplicatePending => {
            return Err(CoreError::Duplicate(format!(
                "A pending application already exists for area {}",
                input.area_id
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::APPLY_CREATED)
            .with_entity("area_apply", apply.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "area_id": apply.area_id })),
    );

    tracing::info!(
        merchant_id,
        area_id = apply.area_id,
        apply_id = apply.id,
        "Area application submitted"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: apply })))
}

/// POST /api/v1/applies/{apply_id}/approve
///
/// Approve a PENDING application: the application resolves, the
/// permission is granted, and the area becomes AUTHORIZED -- atomically.
/// The permission expiry comes from the request, or is derived from the
/// application's requested duration.
pub async fn approve_apply(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(apply_id): Path<DbId>,
    Json(input): Json<ApproveApplyRequest>,
) -> AppResult<impl IntoResponse> {
    let existing = ApplyRepo::find_by_id(&state.pool, apply_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "AreaApply", id: apply_id })?;

    let expires_at = input.expires_at.or_else(|| {
        existing
            .requested_duration_days
            .map(|days| Utc::now() + chrono::Duration::days(i64::from(days)))
    });

    let (apply, permission) = match ApplyRepo::approve(
        &state.pool,
        apply_id,
        user.user_id,
        input.comment.as_deref(),
        expires_at,
    )
    .await?
    {
        ApproveOutcome::Approved { apply, permission } => (apply, permission),
        ApproveOutcome::NotFound => {
            return Err(CoreError::NotFound { entity: "AreaApply", id: apply_id }.into());
        }
        ApproveOutcome::NotPending { status } => {
            return Err(CoreError::InvalidState(format!(
                "Application {apply_id} is already resolved (status {status})"
            ))
            .into());
        }
        ApproveOutcome::AreaNotFound => {
            return Err(
                CoreError::NotFound { entity: "Area", id: existing.area_id }.into(),
            );
        }
        ApproveOutcome::ActivePermissionExists => {
            return Err(CoreError::Duplicate(format!(
                "An active permission already exists for area {}",
                existing.area_id
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::APPLY_APPROVED)
            .with_entity("area_apply", apply.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "area_id": apply.area_id,
                "merchant_id": apply.merchant_id,
                "permission_id": permission.id,
            })),
    );

    tracing::info!(
        reviewer_id = user.user_id,
        apply_id = apply.id,
        permission_id = permission.id,
        "Area application approved"
    );

    Ok(Json(DataResponse {
        data: ApprovalGrant { apply, permission },
    }))
}

/// POST /api/v1/applies/{apply_id}/reject
///
/// Reject a PENDING application with a mandatory reason; the area returns
/// to LOCKED and is immediately re-appliable.
pub async fn reject_apply(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(apply_id): Path<DbId>,
    Json(input): Json<RejectApplyRequest>,
) -> AppResult<impl IntoResponse> {
    if input.reason.trim().is_empty() {
        return Err(CoreError::Validation("Rejection reason must not be empty".into()).into());
    }

    let apply = match ApplyRepo::reject(&state.pool, apply_id, user.user_id, &input.reason).await? {
        RejectOutcome::Rejected(apply) => apply,
        RejectOutcome::NotFound => {
            return Err(CoreError::NotFound { entity: "AreaApply", id: apply_id }.into());
        }
        RejectOutcome::NotPending { status } => {
            return Err(CoreError::InvalidState(format!(
                "Application {apply_id} is already resolved (status {status})"
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::APPLY_REJECTED)
            .with_entity("area_apply", apply.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "area_id": apply.area_id,
                "reason": input.reason,
            })),
    );

    tracing::info!(
        reviewer_id = user.user_id,
        apply_id = apply.id,
        "Area application rejected"
    );

    Ok(Json(DataResponse { data: apply }))
}

/// GET /api/v1/applies/mine
///
/// The calling merchant's applications, newest first.
pub async fn list_my_applies(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;
    let applies = ApplyRepo::list_for_merchant(&state.pool, merchant_id).await?;
    Ok(Json(DataResponse { data: applies }))
}

/// GET /api/v1/applies/pending
///
/// The admin review queue, oldest first.
pub async fn list_pending_applies(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let applies = ApplyRepo::list_pending(&state.pool).await?;
    Ok(Json(DataResponse { data: applies }))
}
