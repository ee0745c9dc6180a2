//! Invitation lifecycle: pending -> accepted | declined.
//!
//! Creation is guarded three ways (inviter membership, invitee not
//! already a member, no other live pending invitation); acceptance flips
//! the status and inserts the membership atomically.

use axum::{extract::State, response::Response, Extension};
use serde_json::json;

use crate::authz;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{CreateInvitation, Invitation, InvitationStatus, Organization, User};
use crate::resource;
use crate::response;

/// Pending, unexpired invitations addressed to the caller's email.
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let user = resource::fetch::<User>(&conn, &auth.user_id)?;
    let invitations = queries::list_pending_invitations_for_email(&conn, &user.email)?;
    Ok(response::ok(json!({ "invitations": invitations })))
}

pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateInvitation>,
) -> Result<Response> {
    input.validate()?;
    let email = input.email.trim().to_lowercase();

    let conn = state.db.get()?;
    let organization = resource::fetch::<Organization>(&conn, &input.organization_id)?;

    let invitation = resource::create(
        &conn,
        &input,
        &auth.user_id,
        |conn, req: &CreateInvitation, user_id| {
            authz::require_membership(conn, user_id, &req.organization_id)?;

            // The invited address may not belong to a registered user yet;
            // when it does, that user must not already be a member.
            if let Some(invitee) = queries::get_user_by_email(conn, &email)? {
                authz::require_not_member(conn, &invitee.id, &req.organization_id)?;
            }

            if queries::has_pending_invitation(conn, &req.organization_id, &email)? {
                return Err(AppError::Conflict(msg::INVITATION_PENDING.into()));
            }

            Ok(Invitation::new(
                req.organization_id.clone(),
                user_id.to_string(),
                email.clone(),
            ))
        },
    )?;

    // Notification is best-effort; the invitation stands either way.
    if let Err(e) = state
        .email
        .send_invitation(&invitation.email, &organization.name, &state.base_url)
        .await
    {
        tracing::warn!("Failed to send invitation email: {}", e);
    }

    Ok(response::created(
        "Invitation created successfully",
        json!({ "invitation": invitation }),
    ))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let mut conn = state.db.get()?;
    let user = resource::fetch::<User>(&conn, &auth.user_id)?;
    let invitation = resource::fetch::<Invitation>(&conn, &id)?;

    if invitation.email != user.email {
        return Err(AppError::Forbidden(msg::INVITATION_WRONG_EMAIL.into()));
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::Conflict(msg::INVITATION_NOT_PENDING.into()));
    }
    if invitation.is_expired(chrono::Utc::now().timestamp()) {
        return Err(AppError::Conflict(msg::INVITATION_EXPIRED.into()));
    }
    authz::require_not_member(&conn, &user.id, &invitation.organization_id)?;

    queries::accept_invitation(&mut conn, &invitation.id, &user.id)?;

    Ok(response::message("Invitation accepted", None))
}

/// Declining checks only that the invitation is addressed to the caller
/// and still pending; an expired invitation can be declined.
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let user = resource::fetch::<User>(&conn, &auth.user_id)?;
    let mut invitation = resource::fetch::<Invitation>(&conn, &id)?;

    if invitation.email != user.email {
        return Err(AppError::Forbidden(msg::INVITATION_WRONG_EMAIL.into()));
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::Conflict(msg::INVITATION_NOT_PENDING.into()));
    }

    invitation.status = InvitationStatus::Declined;
    resource::save(&conn, &mut invitation)?;

    Ok(response::message("Invitation declined", None))
}
