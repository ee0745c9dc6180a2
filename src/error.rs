use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::Envelope;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ExternalService(detail) => {
                // Provider internals stay in the logs, never in the response.
                tracing::error!("Payment provider error: {}", detail);
                (StatusCode::BAD_REQUEST, msg::PROVIDER_REQUEST_FAILED.into())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL.into())
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL.into())
            }
            AppError::Json(e) => (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::INTERNAL.into())
            }
        };

        (status, Json(Envelope::error(error))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Shorthand for the `fetch -> or_not_found` pattern used at most call sites.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

/// User-facing message constants, kept in one place so handlers and tests
/// agree on exact wording.
pub mod msg {
    pub const INTERNAL: &str = "Internal server error";
    pub const PROVIDER_REQUEST_FAILED: &str = "Payment provider request failed";

    pub const AUTH_HEADER_REQUIRED: &str = "Authorization header is required";
    pub const INVALID_TOKEN: &str = "Invalid or expired token";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const ACCOUNT_DISABLED: &str = "Account is disabled";
    pub const ADMIN_REQUIRED: &str = "Admin access required";

    pub const EMAIL_TAKEN: &str = "User with this email already exists";
    pub const EMAIL_INVALID: &str = "A valid email address is required";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
    pub const RESET_TOKEN_INVALID: &str = "Invalid or expired reset token";

    pub const USER_NOT_FOUND: &str = "User not found";
    pub const ORG_NOT_FOUND: &str = "Organization not found";
    pub const INVITATION_NOT_FOUND: &str = "Invitation not found";
    pub const SUBSCRIPTION_NOT_FOUND: &str = "Subscription not found";
    pub const PLAN_NOT_FOUND: &str = "Plan not found";
    pub const RESOURCE_NOT_FOUND: &str = "Resource not found";

    pub const NO_ORG_ACCESS: &str = "You don't have access to this organization";
    pub const NO_PROJECT_ACCESS: &str = "You don't have access to this project";
    pub const ALREADY_MEMBER: &str = "User is already a member of this organization";
    pub const INVITATION_PENDING: &str = "An invitation for this email is already pending";
    pub const INVITATION_NOT_PENDING: &str = "Invitation is no longer pending";
    pub const INVITATION_EXPIRED: &str = "Invitation has expired";
    pub const INVITATION_WRONG_EMAIL: &str = "Invitation is addressed to a different email";

    pub const NAME_EMPTY: &str = "Name cannot be empty";
    pub const ORG_ID_REQUIRED: &str = "Organization ID is required";
    pub const FREE_PLAN_NO_CHECKOUT: &str = "Free plan does not require checkout";
    pub const NO_BILLING_ACCOUNT: &str = "No billing account for this organization";
}
