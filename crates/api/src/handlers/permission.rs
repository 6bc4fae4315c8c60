//! Handlers for the permission ledger.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use atrium_core::error::CoreError;
use atrium_core::guard;
use atrium_core::status::grant_type;
use atrium_core::types::DbId;
use atrium_db::models::permission::{
    CheckActiveQuery, CheckActiveResponse, CreatePermission, GrantRequest, RevokeRequest,
};
use atrium_db::repositories::permission_repo::{GrantOutcome, RevokeOutcome};
use atrium_db::repositories::PermissionRepo;
use atrium_events::{event_types, GovernanceEvent};

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireMerchant};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/permissions
///
/// Direct admin grant over a LOCKED area, bypassing the application
/// workflow. The area becomes AUTHORIZED in the same transaction.
pub async fn grant_permission(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<GrantRequest>,
) -> AppResult<impl IntoResponse> {
    let create = CreatePermission {
        area_id: input.area_id,
        merchant_id: input.merchant_id,
        grant_type: grant_type::ADMIN_APPROVAL.to_string(),
        granted_by: user.user_id,
        expires_at: input.expires_at,
    };

    let permission = match PermissionRepo::grant(&state.pool, &create).await? {
        GrantOutcome::Granted(permission) => permission,
        GrantOutcome::AreaNotFound => {
            return Err(CoreError::NotFound { entity: "Area", id: input.area_id }.into());
        }
        GrantOutcome::AreaNotLocked { status } => {
            return Err(CoreError::InvalidState(format!(
                "Area {} cannot be granted in status {status}",
                input.area_id
            ))
            .into());
        }
        GrantOutcome::ActiveExists => {
            return Err(CoreError::Conflict(format!(
                "An active permission already exists for area {}",
                input.area_id
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::PERMISSION_GRANTED)
            .with_entity("area_permission", permission.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "area_id": permission.area_id,
                "merchant_id": permission.merchant_id,
            })),
    );

    tracing::info!(
        granted_by = user.user_id,
        permission_id = permission.id,
        area_id = permission.area_id,
        "Permission granted directly"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: permission })))
}

/// POST /api/v1/permissions/{permission_id}/revoke
///
/// Revoke an ACTIVE permission with a mandatory reason; the area returns
/// to LOCKED. In-flight proposals for the area are left untouched -- only
/// future edits are blocked.
pub async fn revoke_permission(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(permission_id): Path<DbId>,
    Json(input): Json<RevokeRequest>,
) -> AppResult<impl IntoResponse> {
    if input.reason.trim().is_empty() {
        return Err(CoreError::Validation("Revoke reason must not be empty".into()).into());
    }

    let permission = match PermissionRepo::revoke(
        &state.pool,
        permission_id,
        user.user_id,
        &input.reason,
        input.expected_version,
    )
    .await?
    {
        RevokeOutcome::Revoked(permission) => permission,
        RevokeOutcome::NotFound => {
            return Err(
                CoreError::NotFound { entity: "AreaPermission", id: permission_id }.into(),
            );
        }
        RevokeOutcome::NotActive { status } => {
            return Err(CoreError::InvalidState(format!(
                "Permission {permission_id} is not active (status {status})"
            ))
            .into());
        }
        RevokeOutcome::VersionConflict { actual } => {
            return Err(CoreError::Conflict(format!(
                "Permission {permission_id} was modified concurrently (version {actual})"
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::PERMISSION_REVOKED)
            .with_entity("area_permission", permission.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "area_id": permission.area_id,
                "merchant_id": permission.merchant_id,
                "reason": input.reason,
            })),
    );

    tracing::info!(
        revoked_by = user.user_id,
        permission_id = permission.id,
        area_id = permission.area_id,
        "Permission revoked"
    );

    Ok(Json(DataResponse { data: permission }))
}

/// GET /api/v1/permissions/check?area_id=N
///
/// Whether the calling merchant currently holds editing rights over the
/// area. Applies lazy expiry -- an elapsed grant answers `false` even
/// before the sweep persists the transition.
pub async fn check_active(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
    Query(query): Query<CheckActiveQuery>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;
    let active =
        PermissionRepo::check_active(&state.pool, query.area_id, merchant_id, Utc::now()).await?;
    Ok(Json(DataResponse {
        data: CheckActiveResponse { active },
    }))
}

/// GET /api/v1/permissions/mine
///
/// The calling merchant's live grants.
pub async fn list_my_permissions(
    RequireMerchant(user): RequireMerchant,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let merchant_id = guard::merchant_id(&user.actor())?;
    let permissions =
        PermissionRepo::list_active_for_merchant(&state.pool, merchant_id, Utc::now()).await?;
    Ok(Json(DataResponse { data: permissions }))
}
