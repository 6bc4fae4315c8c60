//! Handlers for the admin audit-log query endpoint.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use atrium_db::models::audit::{AuditLogPage, AuditQuery};
use atrium_db::repositories::AuditLogRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/audit-logs
///
/// Filtered, paginated audit trail (actor, action, entity, time range).
pub async fn query_audit_logs(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let items = AuditLogRepo::query(&state.pool, &params).await?;
    let total = AuditLogRepo::count(&state.pool, &params).await?;
    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}
