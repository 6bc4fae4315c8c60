//! Role-based access control extractors.
//!
//! Each extractor wraps [`AuthUser`] and runs the core authorization
//! guard, so route signatures state their role requirement and the
//! decision logic stays in one tested place. Roles are exact: admins
//! review, merchants edit -- neither implies the other.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use atrium_core::guard;
use atrium_core::roles::{ROLE_ADMIN, ROLE_MERCHANT};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `ADMIN` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        guard::authorize(&user.actor(), ROLE_ADMIN, None)?;
        Ok(RequireAdmin(user))
    }
}

/// Requires the `MERCHANT` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn merchant_only(RequireMerchant(user): RequireMerchant) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireMerchant(pub AuthUser);

impl FromRequestParts<AppState> for RequireMerchant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        guard::authorize(&user.actor(), ROLE_MERCHANT, None)?;
        Ok(RequireMerchant(user))
    }
}
