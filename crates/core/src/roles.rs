//! Well-known role names supplied by the external identity provider.
//!
//! The engine does not manage users; it trusts the role claim embedded in
//! the validated access token. These constants must match the values the
//! identity service mints.

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_MERCHANT: &str = "MERCHANT";
pub const ROLE_USER: &str = "USER";
