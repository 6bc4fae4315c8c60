//! Role and ownership authorization guard.
//!
//! Every facade operation runs [`authorize`] before touching state. The
//! guard is an explicit function rather than middleware magic so the
//! decision is visible at each call site and trivially unit testable.

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_MERCHANT};
use crate::types::DbId;

/// The authenticated actor, as supplied by the external identity
/// provider. Merchants carry their merchant id; admins and plain users do
/// not.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
    pub merchant_id: Option<DbId>,
}

/// Check that `actor` holds `required_role` and, when `resource_owner` is
/// given, that the actor is that merchant.
///
/// Roles are matched exactly: an admin does not implicitly pass a
/// merchant-only gate (admins review, merchants edit), and vice versa.
pub fn authorize(
    actor: &Actor,
    required_role: &str,
    resource_owner: Option<DbId>,
) -> Result<(), CoreError> {
    if actor.role != required_role {
        return Err(CoreError::Forbidden(format!(
            "{required_role} role required"
        )));
    }

    if let Some(owner) = resource_owner {
        // Ownership checks only make sense for merchant-scoped resources.
        if required_role == ROLE_MERCHANT && actor.merchant_id != Some(owner) {
            return Err(CoreError::Forbidden(
                "Resource belongs to another merchant".into(),
            ));
        }
    }

    Ok(())
}

/// The merchant id of a merchant actor.
///
/// Fails if the identity provider handed us a merchant token without a
/// merchant id, which is a contract violation rather than a user error.
pub fn merchant_id(actor: &Actor) -> Result<DbId, CoreError> {
    if actor.role != ROLE_MERCHANT {
        return Err(CoreError::Forbidden(format!("{ROLE_MERCHANT} role required")));
    }
    actor
        .merchant_id
        .ok_or_else(|| CoreError::Unauthorized("Merchant token missing merchant id".into()))
}

/// Shorthand for an admin-only gate.
pub fn require_admin(actor: &Actor) -> Result<(), CoreError> {
    authorize(actor, ROLE_ADMIN, None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::ROLE_USER;

    fn admin() -> Actor {
        Actor {
            user_id: 1,
            role: ROLE_ADMIN.to_string(),
            merchant_id: None,
        }
    }

    fn merchant(id: DbId) -> Actor {
        Actor {
            user_id: 10 + id,
            role: ROLE_MERCHANT.to_string(),
            merchant_id: Some(id),
        }
    }

    #[test]
    fn admin_passes_admin_gate() {
        assert!(require_admin(&admin()).is_ok());
    }

    #[test]
    fn merchant_fails_admin_gate() {
        let err = require_admin(&merchant(7)).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn admin_fails_merchant_gate() {
        let err = authorize(&admin(), ROLE_MERCHANT, None).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn plain_user_fails_both_gates() {
        let user = Actor {
            user_id: 99,
            role: ROLE_USER.to_string(),
            merchant_id: None,
        };
        assert!(authorize(&user, ROLE_ADMIN, None).is_err());
        assert!(authorize(&user, ROLE_MERCHANT, None).is_err());
    }

    #[test]
    fn owner_merchant_passes_ownership_gate() {
        assert!(authorize(&merchant(7), ROLE_MERCHANT, Some(7)).is_ok());
    }

    #[test]
    fn other_merchant_fails_ownership_gate() {
        let err = authorize(&merchant(8), ROLE_MERCHANT, Some(7)).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn merchant_id_requires_the_claim() {
        let broken = Actor {
            user_id: 5,
            role: ROLE_MERCHANT.to_string(),
            merchant_id: None,
        };
        assert!(matches!(
            merchant_id(&broken).unwrap_err(),
            CoreError::Unauthorized(_)
        ));
        assert_eq!(merchant_id(&merchant(3)).unwrap(), 3);
    }
}
