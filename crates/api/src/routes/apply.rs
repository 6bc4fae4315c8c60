//! Route definitions for the application workflow.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::apply;
use crate::state::AppState;

/// Application routes, nested under `/applies`.
///
/// ```text
/// POST   /                       submit_apply
/// GET    /mine                   list_my_applies
/// GET    /pending                list_pending_applies
/// POST   /{apply_id}/approve     approve_apply
/// POST   /{apply_id}/reject      reject_apply
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(apply::submit_apply))
        .route("/mine", get(apply::list_my_applies))
        .route("/pending", get(apply::list_pending_applies))
        .route("/{apply_id}/approve", post(apply::approve_apply))
        .route("/{apply_id}/reject", post(apply::reject_apply))
}
