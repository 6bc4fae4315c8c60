//! Area application row model and request DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atrium_core::types::{DbId, Timestamp};

/// A row from the `area_applies` table. Immutable once resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AreaApply {
    pub id: DbId,
    pub area_id: DbId,
    pub merchant_id: DbId,
    pub reason: String,
    pub requested_duration_days: Option<i32>,
    pub status: String,
    pub reviewer_id: Option<DbId>,
    pub review_comment: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new application.
#[derive(Debug, Clone)]
pub struct CreateApply {
    pub area_id: DbId,
    pub merchant_id: DbId,
    pub reason: String,
    pub requested_duration_days: Option<i32>,
}

/// Request body for the submit endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitApplyRequest {
    pub area_id: DbId,
    pub reason: String,
    pub requested_duration_days: Option<i32>,
}

/// Request body for the approve endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveApplyRequest {
    pub comment: Option<String>,
    /// Overrides the expiry derived from `requested_duration_days`.
    pub expires_at: Option<Timestamp>,
}

/// Request body for the reject endpoint. `reason` must be non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectApplyRequest {
    pub reason: String,
}
