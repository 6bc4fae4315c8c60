//! Layout change proposal row model and request DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atrium_core::layout::ProposalChanges;
use atrium_core::types::{DbId, Timestamp};

/// A row from the `layout_proposals` table.
///
/// `changes` is the frozen `ProposalChanges` delta captured at submit
/// time; the merchant's working copy keeps evolving independently.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LayoutProposal {
    pub id: DbId,
    pub area_id: DbId,
    pub mall_id: DbId,
    pub merchant_id: DbId,
    pub description: Option<String>,
    pub changes: serde_json::Value,
    pub status: String,
    pub layout_version_id: Option<DbId>,
    pub reviewed_by: Option<DbId>,
    pub review_comment: Option<String>,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new proposal.
#[derive(Debug, Clone)]
pub struct CreateProposal {
    pub area_id: DbId,
    pub mall_id: DbId,
    pub merchant_id: DbId,
    pub description: Option<String>,
    pub changes: serde_json::Value,
}

/// Request body for the proposal submit endpoint. Deserializing `changes`
/// into the typed delta up front rejects malformed payloads at the edge.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitProposalRequest {
    pub area_id: DbId,
    pub description: Option<String>,
    pub changes: ProposalChanges,
}

/// Request body for the proposal review endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewProposalRequest {
    pub approve: bool,
    pub comment: Option<String>,
}
