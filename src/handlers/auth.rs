//! Identity lifecycle: register, login, token refresh, password reset.

use axum::{extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::json;

use crate::crypto;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::middleware::AuthUser;
use crate::models::{User, UserRole};
use crate::resource;
use crate::response;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(msg::EMAIL_INVALID.into()));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(msg::PASSWORD_TOO_SHORT.into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<Response> {
    let email = validate_email(&input.email)?;
    validate_password(&input.password)?;

    let conn = state.db.get()?;
    if queries::email_taken(&conn, &email)? {
        return Err(AppError::Conflict(msg::EMAIL_TAKEN.into()));
    }

    let password_hash = crypto::hash_password(&input.password)?;
    let user = User::new(
        email,
        password_hash,
        input.first_name.clone(),
        input.last_name.clone(),
        UserRole::User,
    );
    resource::insert(&conn, &user)?;

    let token = state.tokens.generate(&user.id)?;
    Ok(response::created(
        "User registered successfully",
        json!({ "user": user, "token": token }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_email(&conn, &input.email)?
        .ok_or_else(|| AppError::Unauthorized(msg::INVALID_CREDENTIALS.into()))?;

    if !crypto::verify_password(&input.password, &user.password_hash) {
        return Err(AppError::Unauthorized(msg::INVALID_CREDENTIALS.into()));
    }
    if !user.is_active {
        return Err(AppError::Unauthorized(msg::ACCOUNT_DISABLED.into()));
    }

    let token = state.tokens.generate(&user.id)?;
    Ok(response::message(
        "Login successful",
        Some(json!({ "user": user, "token": token })),
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    // The account must still exist and be active for a fresh token.
    let user = resource::fetch::<User>(&conn, &auth.user_id)
        .map_err(|_| AppError::Unauthorized(msg::INVALID_TOKEN.into()))?;
    if !user.is_active {
        return Err(AppError::Unauthorized(msg::ACCOUNT_DISABLED.into()));
    }

    let token = state.tokens.generate(&user.id)?;
    Ok(response::message(
        "Token refreshed",
        Some(json!({ "token": token })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Always answers success so account existence is not leaked.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> Result<Response> {
    let email = validate_email(&input.email)?;

    let conn = state.db.get()?;
    if let Some(user) = queries::get_user_by_email(&conn, &email)? {
        let token = crypto::generate_token();
        queries::create_password_reset(&conn, &user.id, &crypto::hash_token(&token))?;

        if let Err(e) = state
            .email
            .send_password_reset(&user.email, &token, &state.base_url)
            .await
        {
            tracing::warn!("Failed to send password reset email: {}", e);
        }
    }

    Ok(response::message(
        "If the email exists, a reset link has been sent",
        None,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> Result<Response> {
    validate_password(&input.password)?;

    let mut conn = state.db.get()?;
    let token_hash = crypto::hash_token(&input.token);
    let password_hash = crypto::hash_password(&input.password)?;
    queries::consume_password_reset(&mut conn, &token_hash, &password_hash)?;

    Ok(response::message("Password updated successfully", None))
}
