//! Area row model and builder-facing DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atrium_core::geometry::BoundingBox;
use atrium_core::types::{DbId, Timestamp};

/// A row from the `areas` table.
///
/// `geometry` holds a serialized `RegionGeometry`; handlers deserialize it
/// before running boundary checks.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Area {
    pub id: DbId,
    pub floor_id: DbId,
    pub mall_id: DbId,
    pub name: String,
    pub area_type: String,
    pub geometry: serde_json::Value,
    pub status: String,
    pub merchant_id: Option<DbId>,
    pub version: i32,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An appliable area joined with its floor, for the merchant-facing
/// listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailableArea {
    pub id: DbId,
    pub name: String,
    pub area_type: String,
    pub floor_id: DbId,
    pub floor_name: String,
    pub status: String,
    pub geometry: serde_json::Value,
}

/// Query parameters for the available-areas listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableAreasQuery {
    pub floor_id: Option<DbId>,
}

/// Request body for the boundary pre-check endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateEditRequest {
    pub bounds: BoundingBox,
}

/// Response body for the boundary pre-check endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateEditResponse {
    pub valid: bool,
}
