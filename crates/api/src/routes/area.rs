//! Route definitions for area reads and the boundary pre-check.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::area;
use crate::state::AppState;

/// Area routes, nested under `/areas`.
///
/// ```text
/// GET    /available                 list_available_areas
/// GET    /{area_id}                 get_area
/// POST   /{area_id}/validate-edit   validate_edit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(area::list_available_areas))
        .route("/{area_id}", get(area::get_area))
        .route("/{area_id}/validate-edit", post(area::validate_edit))
}
