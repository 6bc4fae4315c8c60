//! Access-token validation for the external identity provider.
//!
//! The engine does not authenticate users or mint tokens; the identity
//! collaborator issues HS256-signed JWTs and this module only validates
//! the signature and expiry, then trusts the embedded claims.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use atrium_core::types::DbId;

/// Claims embedded in every access token by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id in the identity service.
    pub sub: DbId,
    /// Role name: `"ADMIN"`, `"MERCHANT"`, or `"USER"`.
    pub role: String,
    /// The merchant the user acts for; present on merchant tokens only.
    #[serde(default)]
    pub merchant_id: Option<DbId>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Configuration for token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the identity provider.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from the environment.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty -- the server must
    /// not come up unable to verify tokens.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");
        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Signature, expiration, and issued-at are validated automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        }
    }

    fn mint(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    fn fresh_claims(role: &str, merchant_id: Option<DbId>) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: 42,
            role: role.to_string(),
            merchant_id,
            exp: now + 900,
            iat: now,
        }
    }

    #[test]
    fn valid_token_round_trips_claims() {
        let config = test_config();
        let token = mint(&fresh_claims("MERCHANT", Some(7)), &config.secret);

        let claims = validate_token(&token, &config).expect("validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "MERCHANT");
        assert_eq!(claims.merchant_id, Some(7));
    }

    #[test]
    fn missing_merchant_id_defaults_to_none() {
        let config = test_config();
        let token = mint(&fresh_claims("ADMIN", None), &config.secret);

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.merchant_id, None);
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();
        // Expired well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "USER".to_string(),
            merchant_id: None,
            exp: now - 300,
            iat: now - 600,
        };
        let token = mint(&claims, &config.secret);

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn wrong_secret_fails() {
        let config = test_config();
        let token = mint(&fresh_claims("ADMIN", None), "a-different-secret");

        assert!(validate_token(&token, &config).is_err());
    }
}
