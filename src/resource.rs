//! Generic resource engine.
//!
//! Every persisted entity implements [`Resource`], which describes its
//! table, column list, and how it binds to insert/update statements. The
//! free functions here provide the shared list/get/create/update/delete
//! operations; entity-specific construction and authorization live in the
//! typed `build` closures and [`ApplyUpdate`] impls that callers supply,
//! so field access stays compile-time checked.

use rusqlite::{types::Value, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::from_row::{query_all, query_one, FromRow};
use crate::error::{AppError, Result};

/// A persisted, soft-deletable entity the generic engine can operate on.
pub trait Resource: FromRow + Serialize {
    /// Table name.
    const TABLE: &'static str;
    /// SELECT column list, matching the `FromRow` impl's column order.
    const COLS: &'static str;
    /// Human-readable singular name for error messages ("organization").
    const NAME: &'static str;

    fn id(&self) -> &str;

    /// Column/value pairs for INSERT (including id and timestamps).
    fn insert_fields(&self) -> Vec<(&'static str, Value)>;

    /// Column/value pairs for a full UPDATE (everything mutable plus
    /// `updated_at`; excludes id and `created_at`).
    fn update_fields(&self) -> Vec<(&'static str, Value)>;

    /// Refresh the `updated_at` timestamp before a save.
    fn touch(&mut self, now: i64);
}

/// Entities owned (directly) by an organization, listable through the
/// caller's membership set.
pub trait OrgScoped: Resource {
    fn organization_id(&self) -> &str;
}

/// Typed partial-update application: only fields present (and, for
/// strings, non-empty) in the request overwrite stored values.
pub trait ApplyUpdate<U> {
    fn apply_update(&mut self, update: &U);
}

/// Overwrite `target` only when the update supplies a non-empty value.
/// An omitted field or an empty string both mean "leave unchanged", so a
/// string field cannot be cleared through a partial update.
pub fn set_if_present(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            *target = v.clone();
        }
    }
}

/// Reject ids that are not UUIDs before touching the database.
pub fn parse_id<T: Resource>(id: &str) -> Result<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid {} ID", T::NAME)))
}

fn not_found<T: Resource>() -> AppError {
    let mut name = T::NAME.to_string();
    if let Some(first) = name.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    AppError::NotFound(format!("{} not found", name))
}

/// Fetch a live row by primary key.
pub fn fetch<T: Resource>(conn: &Connection, id: &str) -> Result<T> {
    parse_id::<T>(id)?;
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1 AND deleted_at IS NULL",
        T::COLS,
        T::TABLE
    );
    query_one(conn, &sql, &[&id])?.ok_or_else(not_found::<T>)
}

/// List every live row, unfiltered. Admin surface only.
pub fn list_all<T: Resource>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY created_at",
        T::COLS,
        T::TABLE
    );
    query_all(conn, &sql, &[])
}

/// List live rows scoped to the organizations the user belongs to,
/// optionally narrowed to a single organization. Membership of the narrow
/// filter must be verified by the caller before this runs.
pub fn list_for_member<T: OrgScoped>(
    conn: &Connection,
    user_id: &str,
    organization_id: Option<&str>,
) -> Result<Vec<T>> {
    match organization_id {
        Some(org_id) => {
            let sql = format!(
                "SELECT {} FROM {} WHERE deleted_at IS NULL
                 AND organization_id = ?1
                 AND organization_id IN
                     (SELECT organization_id FROM organization_members WHERE user_id = ?2)
                 ORDER BY created_at",
                T::COLS,
                T::TABLE
            );
            query_all(conn, &sql, &[&org_id, &user_id])
        }
        None => {
            let sql = format!(
                "SELECT {} FROM {} WHERE deleted_at IS NULL
                 AND organization_id IN
                     (SELECT organization_id FROM organization_members WHERE user_id = ?1)
                 ORDER BY created_at",
                T::COLS,
                T::TABLE
            );
            query_all(conn, &sql, &[&user_id])
        }
    }
}

/// Insert a fully-built entity.
pub fn insert<T: Resource>(conn: &Connection, entity: &T) -> Result<()> {
    let fields = entity.insert_fields();
    let cols: Vec<&str> = fields.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        cols.join(", "),
        placeholders.join(", ")
    );
    conn.execute(
        &sql,
        rusqlite::params_from_iter(fields.into_iter().map(|(_, v)| v)),
    )?;
    Ok(())
}

/// Persist the current state of an entity.
pub fn save<T: Resource>(conn: &Connection, entity: &mut T) -> Result<()> {
    entity.touch(chrono::Utc::now().timestamp());
    let fields = entity.update_fields();
    let sets: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, (col, _))| format!("{} = ?{}", col, i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        T::TABLE,
        sets.join(", "),
        fields.len() + 1
    );
    let mut values: Vec<Value> = fields.into_iter().map(|(_, v)| v).collect();
    values.push(entity.id().to_string().into());
    conn.execute(&sql, rusqlite::params_from_iter(values))?;
    Ok(())
}

/// Build an entity from a request (the builder performs entity-specific
/// validation and authorization, and may fail before any write), then
/// persist it.
pub fn create<T, C, F>(conn: &Connection, req: &C, user_id: &str, build: F) -> Result<T>
where
    T: Resource,
    F: FnOnce(&Connection, &C, &str) -> Result<T>,
{
    let entity = build(conn, req, user_id)?;
    insert(conn, &entity)?;
    Ok(entity)
}

/// Fetch, apply a partial update, persist. Returns the updated entity.
pub fn update<T, U>(conn: &Connection, id: &str, req: &U) -> Result<T>
where
    T: Resource + ApplyUpdate<U>,
{
    let mut entity = fetch::<T>(conn, id)?;
    entity.apply_update(req);
    save(conn, &mut entity)?;
    Ok(entity)
}

/// Soft-delete by primary key. NotFound semantics match `fetch`.
pub fn delete<T: Resource>(conn: &Connection, id: &str) -> Result<()> {
    let entity = fetch::<T>(conn, id)?;
    let sql = format!(
        "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        T::TABLE
    );
    conn.execute(&sql, rusqlite::params![chrono::Utc::now().timestamp(), entity.id()])?;
    Ok(())
}
