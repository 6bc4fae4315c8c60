//! Handlers for mall structure reads.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use atrium_core::error::CoreError;
use atrium_core::types::DbId;
use atrium_db::models::mall::{Floor, Mall};
use atrium_db::repositories::MallRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A mall with its floor list, for structure-serving consumers.
#[derive(Debug, Serialize)]
pub struct MallDetail {
    pub mall: Mall,
    pub floors: Vec<Floor>,
}

/// GET /api/v1/malls/{mall_id}
///
/// Mall detail plus floors, for any authenticated caller.
pub async fn get_mall(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(mall_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mall = MallRepo::find_by_id(&state.pool, mall_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Mall", id: mall_id })?;
    let floors = MallRepo::list_floors(&state.pool, mall_id).await?;
    Ok(Json(DataResponse {
        data: MallDetail { mall, floors },
    }))
}
