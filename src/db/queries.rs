//! Typed queries for everything the generic resource engine does not
//! cover: lookups by natural keys, membership management, the
//! multi-statement transactions (organization creation, invitation
//! acceptance, password reset), and the webhook-driven subscription
//! lookups.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{msg, AppError, Result};
use crate::models::*;
use crate::resource;

use super::from_row::{
    query_all, query_one, INVITATION_COLS, MEMBERSHIP_COLS, ORGANIZATION_COLS,
    PASSWORD_RESET_COLS, PLAN_COLS, SETTING_COLS, SUBSCRIPTION_COLS, USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users ============

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users WHERE email = ?1 AND deleted_at IS NULL",
            USER_COLS
        ),
        &[&email],
    )
}

pub fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    Ok(get_user_by_email(conn, email)?.is_some())
}

// ============ Slugs ============

/// Lowercase, collapse anything that isn't alphanumeric into single
/// hyphens, trim hyphens from the ends.
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub fn organization_slug_exists(conn: &Connection, slug: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM organizations WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Generate a globally unique, URL-safe slug from a name (or an explicit
/// base). Collisions resolve by appending `-1`, `-2`, ... to the base.
pub fn generate_unique_slug(
    conn: &Connection,
    name: &str,
    existing_slug: Option<&str>,
) -> Result<String> {
    let base = match existing_slug {
        Some(s) if !s.trim().is_empty() => slugify(s),
        _ => slugify(name),
    };
    let base = if base.is_empty() { "org".to_string() } else { base };

    let mut slug = base.clone();
    let mut counter = 1;
    while organization_slug_exists(conn, &slug)? {
        slug = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(slug)
}

// ============ Organizations ============

/// Create an organization and its creator membership atomically.
pub fn create_organization(
    conn: &mut Connection,
    input: &CreateOrganization,
    creator_id: &str,
) -> Result<Organization> {
    let tx = conn.transaction()?;

    let slug = generate_unique_slug(&tx, &input.name, input.slug.as_deref())?;
    let org = Organization::new(
        input.name.clone(),
        slug,
        input.description.clone().unwrap_or_default(),
    );
    resource::insert(&tx, &org)?;
    tx.execute(
        "INSERT INTO organization_members (user_id, organization_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![creator_id, org.id, now()],
    )?;

    tx.commit()?;
    Ok(org)
}

pub fn get_organization_by_slug(conn: &Connection, slug: &str) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM organizations WHERE slug = ?1 AND deleted_at IS NULL",
            ORGANIZATION_COLS
        ),
        &[&slug],
    )
}

/// Organizations the user belongs to.
pub fn list_organizations_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Organization>> {
    let cols: String = ORGANIZATION_COLS
        .split(", ")
        .map(|c| format!("o.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    query_all(
        conn,
        &format!(
            "SELECT {} FROM organizations o
             JOIN organization_members m ON m.organization_id = o.id
             WHERE m.user_id = ?1 AND o.deleted_at IS NULL
             ORDER BY o.created_at",
            cols
        ),
        &[&user_id],
    )
}

// ============ Memberships ============

pub fn is_org_member(conn: &Connection, user_id: &str, organization_id: &str) -> Result<bool> {
    let membership: Option<Membership> = query_one(
        conn,
        &format!(
            "SELECT {} FROM organization_members WHERE user_id = ?1 AND organization_id = ?2",
            MEMBERSHIP_COLS
        ),
        &[&user_id, &organization_id],
    )?;
    Ok(membership.is_some())
}

pub fn add_organization_member(
    conn: &Connection,
    user_id: &str,
    organization_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO organization_members (user_id, organization_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![user_id, organization_id, now()],
    )?;
    Ok(())
}

pub fn remove_organization_member(
    conn: &Connection,
    user_id: &str,
    organization_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM organization_members WHERE user_id = ?1 AND organization_id = ?2",
        params![user_id, organization_id],
    )?;
    Ok(affected > 0)
}

pub fn user_org_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT organization_id FROM organization_members WHERE user_id = ?1")?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

pub fn count_org_members(conn: &Connection, organization_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM organization_members WHERE organization_id = ?1",
        params![organization_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// First user who joined the organization; billing notifications go here.
pub fn get_org_owner(conn: &Connection, organization_id: &str) -> Result<Option<User>> {
    let cols: String = USER_COLS
        .split(", ")
        .map(|c| format!("u.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users u
             JOIN organization_members m ON m.user_id = u.id
             WHERE m.organization_id = ?1 AND u.deleted_at IS NULL
             ORDER BY m.created_at
             LIMIT 1",
            cols
        ),
        &[&organization_id],
    )
}

// ============ Invitations ============

pub fn find_pending_invitation(
    conn: &Connection,
    organization_id: &str,
    email: &str,
) -> Result<Option<Invitation>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM invitations
             WHERE organization_id = ?1 AND email = ?2 AND status = 'pending'
               AND expires_at > ?3 AND deleted_at IS NULL",
            INVITATION_COLS
        ),
        &[&organization_id, &email, &now()],
    )
}

pub fn has_pending_invitation(
    conn: &Connection,
    organization_id: &str,
    email: &str,
) -> Result<bool> {
    Ok(find_pending_invitation(conn, organization_id, email)?.is_some())
}

/// Pending, unexpired invitations addressed to an email.
pub fn list_pending_invitations_for_email(
    conn: &Connection,
    email: &str,
) -> Result<Vec<Invitation>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM invitations
             WHERE email = ?1 AND status = 'pending' AND expires_at > ?2
               AND deleted_at IS NULL
             ORDER BY created_at",
            INVITATION_COLS
        ),
        &[&email, &now()],
    )
}

/// Accept an invitation: flip the status and insert the membership row in
/// one transaction. The status flip is conditional on the row still being
/// `pending`, so two concurrent accepts cannot both succeed.
pub fn accept_invitation(conn: &mut Connection, invitation_id: &str, user_id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let affected = tx.execute(
        "UPDATE invitations SET status = 'accepted', updated_at = ?1
         WHERE id = ?2 AND status = 'pending'",
        params![now(), invitation_id],
    )?;
    if affected == 0 {
        return Err(AppError::Conflict(msg::INVITATION_NOT_PENDING.into()));
    }

    let organization_id: String = tx.query_row(
        "SELECT organization_id FROM invitations WHERE id = ?1",
        params![invitation_id],
        |row| row.get(0),
    )?;
    tx.execute(
        "INSERT INTO organization_members (user_id, organization_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![user_id, organization_id, now()],
    )?;

    tx.commit()?;
    Ok(())
}

// ============ Subscriptions ============

/// The organization's current subscription row, if any. Most recent wins
/// if historical rows exist.
pub fn get_subscription_for_org(
    conn: &Connection,
    organization_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions
             WHERE organization_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC
             LIMIT 1",
            SUBSCRIPTION_COLS
        ),
        &[&organization_id],
    )
}

pub fn get_subscription_by_provider_id(
    conn: &Connection,
    stripe_subscription_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions
             WHERE stripe_subscription_id = ?1 AND deleted_at IS NULL",
            SUBSCRIPTION_COLS
        ),
        &[&stripe_subscription_id],
    )
}

// ============ Plans ============

pub fn get_active_plan_by_name(conn: &Connection, name: &str) -> Result<Option<Plan>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM plans
             WHERE name = ?1 AND is_active = 1 AND deleted_at IS NULL",
            PLAN_COLS
        ),
        &[&name],
    )
}

pub fn plan_name_taken(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM plans WHERE name = ?1 AND deleted_at IS NULL",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_active_plans(conn: &Connection) -> Result<Vec<Plan>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM plans
             WHERE is_active = 1 AND deleted_at IS NULL
             ORDER BY sort_order, name",
            PLAN_COLS
        ),
        &[],
    )
}

// ============ Settings ============

pub fn get_setting_by_key(conn: &Connection, key: &str) -> Result<Option<Setting>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM settings WHERE key = ?1 AND deleted_at IS NULL",
            SETTING_COLS
        ),
        &[&key],
    )
}

pub fn list_public_settings(conn: &Connection) -> Result<Vec<Setting>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM settings
             WHERE is_public = 1 AND deleted_at IS NULL
             ORDER BY key",
            SETTING_COLS
        ),
        &[],
    )
}

// ============ Password resets ============

pub fn create_password_reset(conn: &Connection, user_id: &str, token_hash: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO password_resets (token_hash, user_id, expires_at, used, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![token_hash, user_id, now() + RESET_TOKEN_TTL_SECS, now()],
    )?;
    Ok(())
}

pub fn find_valid_password_reset(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<PasswordReset>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM password_resets
             WHERE token_hash = ?1 AND used = 0 AND expires_at > ?2",
            PASSWORD_RESET_COLS
        ),
        &[&token_hash, &now()],
    )
}

/// Set the user's new password and consume the token in one transaction.
pub fn consume_password_reset(
    conn: &mut Connection,
    token_hash: &str,
    new_password_hash: &str,
) -> Result<()> {
    let tx = conn.transaction()?;

    let user_id: Option<String> = tx
        .query_row(
            "SELECT user_id FROM password_resets
             WHERE token_hash = ?1 AND used = 0 AND expires_at > ?2",
            params![token_hash, now()],
            |row| row.get(0),
        )
        .optional()?;
    let user_id = user_id.ok_or_else(|| AppError::Validation(msg::RESET_TOKEN_INVALID.into()))?;

    tx.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![new_password_hash, now(), user_id],
    )?;
    tx.execute(
        "UPDATE password_resets SET used = 1 WHERE token_hash = ?1",
        params![token_hash],
    )?;

    tx.commit()?;
    Ok(())
}

// ============ Counts (admin stats) ============

pub fn count_projects_with_status(conn: &Connection, status: ProjectStatus) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM projects WHERE status = ?1 AND deleted_at IS NULL",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}
