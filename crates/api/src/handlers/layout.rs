//! Handlers for the layout version lifecycle.
//!
//! Draft creation re-validates every placed object against its area's
//! authorized region -- the builder's client-side checks and the
//! submission-time check are advisory; this is the non-bypassable gate
//! before anything can be published.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use atrium_core::error::CoreError;
use atrium_core::geometry::{self, RegionGeometry};
use atrium_core::layout::{merge_snapshot, ProposalChanges, SceneObject};
use atrium_core::roles::ROLE_ADMIN;
use atrium_core::types::DbId;
use atrium_db::models::layout::{
    CreateDraftRequest, CreateVersion, PublishRequest, RollbackRequest,
};
use atrium_db::models::proposal::LayoutProposal;
use atrium_db::repositories::layout_repo::{DraftOutcome, PublishOutcome, RollbackOutcome};
use atrium_db::repositories::{AreaRepo, LayoutVersionRepo, ProposalRepo};
use atrium_events::{event_types, GovernanceEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Deserialize a proposal's frozen delta.
fn parse_changes(proposal: &LayoutProposal) -> Result<ProposalChanges, AppError> {
    serde_json::from_value(proposal.changes.clone()).map_err(|e| {
        AppError::InternalError(format!(
            "Corrupt changes stored for proposal {}: {e}",
            proposal.id
        ))
    })
}

/// Re-validate every placed object in `changes` against its area's
/// authorized region, caching region lookups across proposals.
async fn validate_against_areas(
    state: &AppState,
    changes: &ProposalChanges,
    regions: &mut HashMap<DbId, RegionGeometry>,
) -> AppResult<()> {
    for object in changes.placed_objects() {
        if !regions.contains_key(&object.area_id) {
            let area = AreaRepo::find_by_id(&state.pool, object.area_id)
                .await?
                .ok_or(CoreError::NotFound { entity: "Area", id: object.area_id })?;
            let region = serde_json::from_value(area.geometry.clone()).map_err(|e| {
                AppError::InternalError(format!("Corrupt geometry stored for area {}: {e}", area.id))
            })?;
            regions.insert(object.area_id, region);
        }
        let region = &regions[&object.area_id];
        geometry::validate_edit(region, &object.bounds).map_err(CoreError::from)?;
    }
    Ok(())
}

/// POST /api/v1/malls/{mall_id}/versions
///
/// Collect APPROVED proposals into a new DRAFT version. The snapshot is
/// the current ACTIVE snapshot (or empty) with the proposals' deltas
/// folded in, in submission order.
pub async fn create_draft(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(mall_id): Path<DbId>,
    Json(input): Json<CreateDraftRequest>,
) -> AppResult<impl IntoResponse> {
    if input.proposal_ids.is_empty() {
        return Err(CoreError::Validation("proposal_ids must not be empty".into()).into());
    }

    let mut proposals = ProposalRepo::find_many(&state.pool, &input.proposal_ids).await?;
    for &id in &input.proposal_ids {
        if !proposals.iter().any(|p| p.id == id) {
            return Err(CoreError::NotFound { entity: "LayoutProposal", id }.into());
        }
    }
    proposals.sort_by_key(|p| p.submitted_at);

    // Base snapshot: whatever is currently published, or empty.
    let base: Vec<SceneObject> = match LayoutVersionRepo::find_active(&state.pool, mall_id).await? {
        Some(active) => serde_json::from_value(active.snapshot).map_err(|e| {
            AppError::InternalError(format!("Corrupt snapshot on active version: {e}"))
        })?,
        None => Vec::new(),
    };

    // Authoritative boundary re-validation of every delta.
    let mut regions: HashMap<DbId, RegionGeometry> = HashMap::new();
    let mut deltas: Vec<ProposalChanges> = Vec::with_capacity(proposals.len());
    for proposal in &proposals {
        let changes = parse_changes(proposal)?;
        validate_against_areas(&state, &changes, &mut regions).await?;
        deltas.push(changes);
    }

    let merged = merge_snapshot(&base, &deltas);
    let create = CreateVersion {
        mall_id,
        snapshot: serde_json::to_value(&merged)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize snapshot: {e}")))?,
        description: input.description,
        created_by: user.user_id,
        created_by_role: ROLE_ADMIN.to_string(),
    };

    let draft = match LayoutVersionRepo::create_draft(&state.pool, &create, &input.proposal_ids)
        .await?
    {
        DraftOutcome::Created(draft) => draft,
        DraftOutcome::MallNotFound => {
            return Err(CoreError::NotFound { entity: "Mall", id: mall_id }.into());
        }
        DraftOutcome::ProposalNotFound { id } => {
            return Err(CoreError::NotFound { entity: "LayoutProposal", id }.into());
        }
        DraftOutcome::ProposalNotApproved { id, status } => {
            return Err(CoreError::InvalidState(format!(
                "Proposal {id} is not approved (status {status})"
            ))
            .into());
        }
        DraftOutcome::ProposalAlreadyCollected { id } => {
            return Err(CoreError::InvalidState(format!(
                "Proposal {id} already belongs to another draft"
            ))
            .into());
        }
        DraftOutcome::ProposalWrongMall { id } => {
            return Err(CoreError::Validation(format!(
                "Proposal {id} does not belong to mall {mall_id}"
            ))
            .into());
        }
    };

    tracing::info!(
        created_by = user.user_id,
        mall_id,
        version_id = draft.id,
        version_number = draft.version_number,
        "Draft layout version created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: draft })))
}

/// POST /api/v1/versions/{version_id}/publish
///
/// Promote a DRAFT to ACTIVE. The previously ACTIVE version is archived,
/// the collected proposals become MERGED, and the mall's cached pointer
/// is refreshed -- all in one transaction.
pub async fn publish_version(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    Json(input): Json<PublishRequest>,
) -> AppResult<impl IntoResponse> {
    let (version, archived_id) = match LayoutVersionRepo::publish(
        &state.pool,
        version_id,
        user.user_id,
        input.expected_version,
    )
    .await?
    {
        PublishOutcome::Published { version, archived_id } => (version, archived_id),
        PublishOutcome::NotFound => {
            return Err(CoreError::NotFound { entity: "LayoutVersion", id: version_id }.into());
        }
        PublishOutcome::NotDraft { status } => {
            return Err(CoreError::InvalidState(format!(
                "Version {version_id} is not a draft (status {status})"
            ))
            .into());
        }
        PublishOutcome::VersionConflict { actual } => {
            return Err(CoreError::Conflict(format!(
                "Version {version_id} was modified concurrently (version {actual})"
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::VERSION_PUBLISHED)
            .with_entity("layout_version", version.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "mall_id": version.mall_id,
                "version_number": version.version_number,
                "archived_version_id": archived_id,
            })),
    );

    tracing::info!(
        published_by = user.user_id,
        version_id = version.id,
        mall_id = version.mall_id,
        archived_id,
        "Layout version published"
    );

    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/malls/{mall_id}/rollback
///
/// Republish an earlier snapshot as a brand-new version. History is
/// never rewritten.
pub async fn rollback(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(mall_id): Path<DbId>,
    Json(input): Json<RollbackRequest>,
) -> AppResult<impl IntoResponse> {
    let (version, archived_id) = match LayoutVersionRepo::rollback(
        &state.pool,
        mall_id,
        input.target_version_id,
        user.user_id,
        ROLE_ADMIN,
    )
    .await?
    {
        RollbackOutcome::RolledBack { version, archived_id } => (version, archived_id),
        RollbackOutcome::MallNotFound => {
            return Err(CoreError::NotFound { entity: "Mall", id: mall_id }.into());
        }
        RollbackOutcome::TargetNotFound => {
            return Err(CoreError::NotFound {
                entity: "LayoutVersion",
                id: input.target_version_id,
            }
            .into());
        }
        RollbackOutcome::TargetIsDraft => {
            return Err(CoreError::InvalidState(format!(
                "Version {} has never been published",
                input.target_version_id
            ))
            .into());
        }
    };

    state.event_bus.publish(
        GovernanceEvent::new(event_types::VERSION_PUBLISHED)
            .with_entity("layout_version", version.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({
                "mall_id": version.mall_id,
                "version_number": version.version_number,
                "archived_version_id": archived_id,
                "rollback_of": input.target_version_id,
            })),
    );

    tracing::info!(
        rolled_back_by = user.user_id,
        mall_id,
        target_version_id = input.target_version_id,
        new_version_id = version.id,
        "Layout rolled back"
    );

    Ok(Json(DataResponse { data: version }))
}

/// GET /api/v1/malls/{mall_id}/versions/active
///
/// The mall's currently published structure; 404 only if the mall has
/// never published anything.
pub async fn get_active(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(mall_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let version = LayoutVersionRepo::find_active(&state.pool, mall_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "LayoutVersion", id: mall_id })?;
    Ok(Json(DataResponse { data: version }))
}

/// GET /api/v1/malls/{mall_id}/versions
///
/// Version history for a mall, newest first.
pub async fn list_versions(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    Path(mall_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let versions = LayoutVersionRepo::list_for_mall(&state.pool, mall_id).await?;
    Ok(Json(DataResponse { data: versions }))
}
