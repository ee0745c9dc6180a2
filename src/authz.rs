//! Membership, ownership, and admin predicates.
//!
//! Access to organization- and project-rooted resources reduces to two
//! checks: a membership row exists for the owning organization, or the
//! caller's user record carries the admin role. Denials use one uniform
//! "no access" response so existence is not distinguishable from lack of
//! access.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{msg, AppError, Result};
use crate::models::{Project, User};
use crate::resource;

/// Require that the user belongs to the organization.
pub fn require_membership(conn: &Connection, user_id: &str, organization_id: &str) -> Result<()> {
    if queries::is_org_member(conn, user_id, organization_id)? {
        Ok(())
    } else {
        Err(AppError::Forbidden(msg::NO_ORG_ACCESS.into()))
    }
}

/// Require that the user does NOT belong to the organization (invitation
/// guards).
pub fn require_not_member(conn: &Connection, user_id: &str, organization_id: &str) -> Result<()> {
    if queries::is_org_member(conn, user_id, organization_id)? {
        Err(AppError::Conflict(msg::ALREADY_MEMBER.into()))
    } else {
        Ok(())
    }
}

/// Project access is membership of the owning organization, transitively.
pub fn require_project_access(conn: &Connection, user_id: &str, project: &Project) -> Result<()> {
    if queries::is_org_member(conn, user_id, &project.organization_id)? {
        Ok(())
    } else {
        Err(AppError::Forbidden(msg::NO_PROJECT_ACCESS.into()))
    }
}

/// Require the admin role. Independent of organization membership; gates
/// the admin resource surface and settings management.
pub fn require_admin(conn: &Connection, user_id: &str) -> Result<User> {
    let user = resource::fetch::<User>(conn, user_id)
        .map_err(|_| AppError::Forbidden(msg::ADMIN_REQUIRED.into()))?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::Forbidden(msg::ADMIN_REQUIRED.into()))
    }
}
