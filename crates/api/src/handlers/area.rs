//! Handlers for area reads and the boundary pre-check.
//!
//! The external builder uses `validate-edit` as an advisory check before
//! accepting a local placement; the authoritative re-validation happens
//! at draft-creation time.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use atrium_core::error::CoreError;
use atrium_core::geometry::{self, RegionGeometry};
use atrium_core::types::DbId;
use atrium_db::models::area::{Area, AvailableAreasQuery, ValidateEditRequest, ValidateEditResponse};
use atrium_db::repositories::AreaRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireMerchant;
use crate::response::DataResponse;
use crate::state::AppState;

/// Deserialize an area's stored geometry.
///
/// A parse failure here means the stored row is corrupt, which is an
/// internal error, not a caller mistake.
pub(crate) fn parse_region(area: &Area) -> Result<RegionGeometry, AppError> {
    serde_json::from_value(area.geometry.clone()).map_err(|e| {
        AppError::InternalError(format!("Corrupt geometry stored for area {}: {e}", area.id))
    })
}

/// Fetch an area or fail with the typed not-found error.
pub(crate) async fn ensure_area_exists(
    pool: &atrium_db::DbPool,
    area_id: DbId,
) -> AppResult<Area> {
    AreaRepo::find_by_id(pool, area_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Area", id: area_id }))
}

/// GET /api/v1/areas/available
///
/// Areas a merchant may currently apply for, optionally filtered to one
/// floor.
pub async fn list_available_areas(
    RequireMerchant(_user): RequireMerchant,
    State(state): State<AppState>,
    Query(query): Query<AvailableAreasQuery>,
) -> AppResult<impl IntoResponse> {
    let areas = AreaRepo::list_available(&state.pool, query.floor_id).await?;
    Ok(Json(DataResponse { data: areas }))
}

/// GET /api/v1/areas/{area_id}
///
/// Area detail, including geometry, for any authenticated caller.
pub async fn get_area(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(area_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let area = ensure_area_exists(&state.pool, area_id).await?;
    Ok(Json(DataResponse { data: area }))
}

/// POST /api/v1/areas/{area_id}/validate-edit
///
/// Check a proposed object placement against the area's authorized
/// region. Returns 422 with the offending corner and the region on
/// violation.
pub async fn validate_edit(
    RequireMerchant(_user): RequireMerchant,
    State(state): State<AppState>,
    Path(area_id): Path<DbId>,
    Json(input): Json<ValidateEditRequest>,
) -> AppResult<impl IntoResponse> {
    let area = ensure_area_exists(&state.pool, area_id).await?;
    let region = parse_region(&area)?;

    geometry::validate_edit(&region, &input.bounds).map_err(CoreError::from)?;

    Ok(Json(DataResponse {
        data: ValidateEditResponse { valid: true },
    }))
}
