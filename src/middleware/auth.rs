use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{msg, AppError};

/// Authenticated caller, inserted into request extensions by
/// [`auth_required`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Extract a Bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Require a valid bearer token; resolves it to a user id and makes
/// [`AuthUser`] available to downstream handlers.
pub async fn auth_required(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized(msg::AUTH_HEADER_REQUIRED.into()))?;

    let user_id = state.tokens.verify(token)?;
    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
