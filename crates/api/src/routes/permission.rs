//! Route definitions for the permission ledger.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::permission;
use crate::state::AppState;

/// Permission routes, nested under `/permissions`.
///
/// ```text
/// POST   /                            grant_permission
/// GET    /mine                        list_my_permissions
/// GET    /check                       check_active
/// POST   /{permission_id}/revoke      revoke_permission
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(permission::grant_permission))
        .route("/mine", get(permission::list_my_permissions))
        .route("/check", get(permission::check_active))
        .route("/{permission_id}/revoke", post(permission::revoke_permission))
}
