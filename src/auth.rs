//! Bearer-token issuing and verification.
//!
//! Tokens are HS256 JWTs with a single custom claim carrying the user id.
//! The signing key is derived from the configured secret at startup and
//! shared through `AppState`.

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: String,
}

#[derive(Clone)]
pub struct TokenKeys {
    key: HS256Key,
    expiry_hours: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a token for a user id.
    pub fn generate(&self, user_id: &str) -> Result<String> {
        let claims = Claims::with_custom_claims(
            TokenClaims {
                user_id: user_id.to_string(),
            },
            Duration::from_hours(self.expiry_hours as u64),
        );
        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        let claims = self
            .key
            .verify_token::<TokenClaims>(token, None)
            .map_err(|_| AppError::Unauthorized(msg::INVALID_TOKEN.into()))?;
        Ok(claims.custom.user_id)
    }
}
