//! Area permission row model and request DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atrium_core::types::{DbId, Timestamp};

/// A row from the `area_permissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AreaPermission {
    pub id: DbId,
    pub area_id: DbId,
    pub merchant_id: DbId,
    pub grant_type: String,
    pub status: String,
    pub granted_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub granted_by: DbId,
    pub revoked_at: Option<Timestamp>,
    pub revoked_by: Option<DbId>,
    pub revoke_reason: Option<String>,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new permission.
#[derive(Debug, Clone)]
pub struct CreatePermission {
    pub area_id: DbId,
    pub merchant_id: DbId,
    pub grant_type: String,
    pub granted_by: DbId,
    pub expires_at: Option<Timestamp>,
}

/// Request body for the direct admin grant endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantRequest {
    pub area_id: DbId,
    pub merchant_id: DbId,
    pub expires_at: Option<Timestamp>,
}

/// Request body for the revoke endpoint. `reason` must be non-empty;
/// `expected_version` enables optimistic-concurrency checking.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeRequest {
    pub reason: String,
    pub expected_version: Option<i32>,
}

/// Query parameters for the checkActive endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckActiveQuery {
    pub area_id: DbId,
}

/// Response body for the checkActive endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CheckActiveResponse {
    pub active: bool,
}
