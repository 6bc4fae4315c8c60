//! Layout version row model and request DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atrium_core::types::{DbId, Timestamp};

/// A row from the `layout_versions` table.
///
/// `snapshot` holds the serialized `Vec<SceneObject>` merged from the
/// collected proposals. Snapshots are immutable once the row leaves DRAFT.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LayoutVersion {
    pub id: DbId,
    pub mall_id: DbId,
    pub version_number: i32,
    pub status: String,
    pub snapshot: serde_json::Value,
    pub description: Option<String>,
    pub created_by: DbId,
    pub created_by_role: String,
    pub published_at: Option<Timestamp>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new version row.
#[derive(Debug, Clone)]
pub struct CreateVersion {
    pub mall_id: DbId,
    pub snapshot: serde_json::Value,
    pub description: Option<String>,
    pub created_by: DbId,
    pub created_by_role: String,
}

/// Request body for the createDraft endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraftRequest {
    pub proposal_ids: Vec<DbId>,
    pub description: Option<String>,
}

/// Request body for the publish endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishRequest {
    /// Optimistic-concurrency check against the version row's counter.
    pub expected_version: Option<i32>,
}

/// Request body for the rollback endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RollbackRequest {
    pub target_version_id: DbId,
}
