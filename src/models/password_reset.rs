use serde::{Deserialize, Serialize};

/// How long a password-reset token stays usable.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Single-use password-reset token. Only the digest is stored; the raw
/// token goes out by email and is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub token_hash: String,
    pub user_id: String,
    pub expires_at: i64,
    pub used: bool,
    pub created_at: i64,
}
