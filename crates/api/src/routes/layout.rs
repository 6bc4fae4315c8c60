//! Route definitions for the layout version lifecycle.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{layout, mall};
use crate::state::AppState;

/// Mall structure and version lifecycle routes.
///
/// ```text
/// GET    /malls/{mall_id}                   get_mall
/// POST   /malls/{mall_id}/versions          create_draft
/// GET    /malls/{mall_id}/versions          list_versions
/// GET    /malls/{mall_id}/versions/active   get_active
/// POST   /malls/{mall_id}/rollback          rollback
/// POST   /versions/{version_id}/publish     publish_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/malls/{mall_id}", get(mall::get_mall))
        .route(
            "/malls/{mall_id}/versions",
            post(layout::create_draft).get(layout::list_versions),
        )
        .route("/malls/{mall_id}/versions/active", get(layout::get_active))
        .route("/malls/{mall_id}/rollback", post(layout::rollback))
        .route("/versions/{version_id}/publish", post(layout::publish_version))
}
