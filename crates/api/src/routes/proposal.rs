//! Route definitions for layout change proposals.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::proposal;
use crate::state::AppState;

/// Proposal routes, nested under `/proposals`.
///
/// ```text
/// POST   /                           submit_proposal
/// GET    /mine                       list_my_proposals
/// GET    /pending                    list_pending_proposals
/// POST   /{proposal_id}/review       review_proposal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(proposal::submit_proposal))
        .route("/mine", get(proposal::list_my_proposals))
        .route("/pending", get(proposal::list_pending_proposals))
        .route("/{proposal_id}/review", post(proposal::review_proposal))
}
