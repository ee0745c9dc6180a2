//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` against the column order of their `*_COLS`
//! constant; `query_one` and `query_all` cover the common query shapes.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupted rows.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at, deleted_at";

pub const ORGANIZATION_COLS: &str =
    "id, name, slug, description, created_at, updated_at, deleted_at";

pub const MEMBERSHIP_COLS: &str = "user_id, organization_id, created_at";

pub const PROJECT_COLS: &str =
    "id, organization_id, name, description, status, created_at, updated_at, deleted_at";

pub const INVITATION_COLS: &str =
    "id, organization_id, inviter_id, email, status, expires_at, created_at, updated_at, deleted_at";

pub const SUBSCRIPTION_COLS: &str = "id, organization_id, plan_name, status, billing_period, start_date, end_date, stripe_customer_id, stripe_subscription_id, created_at, updated_at, deleted_at";

pub const PLAN_COLS: &str = "id, name, display_name, description, monthly_price, yearly_price, stripe_price_id_monthly, stripe_price_id_yearly, max_organizations, max_projects, max_members, has_priority_support, has_advanced_features, has_custom_integrations, is_active, sort_order, created_at, updated_at, deleted_at";

pub const SETTING_COLS: &str =
    "id, key, value, category, is_public, created_at, updated_at, deleted_at";

pub const PASSWORD_RESET_COLS: &str = "token_hash, user_id, expires_at, used, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            role: parse_enum(row, 5, "role")?,
            is_active: row.get::<_, i32>(6)? != 0,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            deleted_at: row.get(9)?,
        })
    }
}

impl FromRow for Organization {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organization {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            deleted_at: row.get(6)?,
        })
    }
}

impl FromRow for Membership {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Membership {
            user_id: row.get(0)?,
            organization_id: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }
}

impl FromRow for Invitation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Invitation {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            inviter_id: row.get(2)?,
            email: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            expires_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            deleted_at: row.get(8)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            plan_name: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            billing_period: parse_enum(row, 4, "billing_period")?,
            start_date: row.get(5)?,
            end_date: row.get(6)?,
            stripe_customer_id: row.get(7)?,
            stripe_subscription_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            deleted_at: row.get(11)?,
        })
    }
}

impl FromRow for Plan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Plan {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get(2)?,
            description: row.get(3)?,
            monthly_price: row.get(4)?,
            yearly_price: row.get(5)?,
            stripe_price_id_monthly: row.get(6)?,
            stripe_price_id_yearly: row.get(7)?,
            max_organizations: row.get(8)?,
            max_projects: row.get(9)?,
            max_members: row.get(10)?,
            has_priority_support: row.get::<_, i32>(11)? != 0,
            has_advanced_features: row.get::<_, i32>(12)? != 0,
            has_custom_integrations: row.get::<_, i32>(13)? != 0,
            is_active: row.get::<_, i32>(14)? != 0,
            sort_order: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
            deleted_at: row.get(18)?,
        })
    }
}

impl FromRow for Setting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Setting {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            category: row.get(3)?,
            is_public: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }
}

impl FromRow for PasswordReset {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PasswordReset {
            token_hash: row.get(0)?,
            user_id: row.get(1)?,
            expires_at: row.get(2)?,
            used: row.get::<_, i32>(3)? != 0,
            created_at: row.get(4)?,
        })
    }
}
