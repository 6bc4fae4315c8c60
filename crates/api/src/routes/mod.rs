pub mod apply;
pub mod area;
pub mod audit;
pub mod health;
pub mod layout;
pub mod permission;
pub mod proposal;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /areas/available                     appliable areas (merchant)
/// /areas/{id}                          area detail (any authed)
/// /areas/{id}/validate-edit            boundary pre-check (merchant)
///
/// /applies                             submit application (merchant)
/// /applies/mine                        own applications (merchant)
/// /applies/pending                     review queue (admin)
/// /applies/{id}/approve                approve (admin)
/// /applies/{id}/reject                 reject (admin)
///
/// /permissions                         direct grant (admin)
/// /permissions/mine                    live grants (merchant)
/// /permissions/check                   checkActive (merchant)
/// /permissions/{id}/revoke             revoke (admin)
///
/// /proposals                           submit proposal (merchant)
/// /proposals/mine                      own proposals (merchant)
/// /proposals/pending                   review queue (admin)
/// /proposals/{id}/review               approve/reject (admin)
///
/// /malls/{mall_id}                     mall detail + floors (any authed)
/// /malls/{mall_id}/versions            createDraft (POST), history (GET)
/// /malls/{mall_id}/versions/active     getActive (any authed)
/// /malls/{mall_id}/rollback            rollback (admin)
/// /versions/{id}/publish               publish (admin)
///
/// /audit-logs                          filtered audit query (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/areas", area::router())
        .nest("/applies", apply::router())
        .nest("/permissions", permission::router())
        .nest("/proposals", proposal::router())
        .merge(layout::router())
        .nest("/audit-logs", audit::router())
}
