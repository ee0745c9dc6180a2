//! Registry-driven admin façade.
//!
//! Handlers resolve the resource name against the registry built at
//! startup and operate through its type-erased hooks; nothing here knows
//! the concrete entity types.

use axum::{extract::State, response::Response, Extension};
use serde_json::{json, Map, Value};

use crate::authz;
use crate::db::AppState;
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{
    Invitation, Organization, Plan, Project, ProjectStatus, Setting, Subscription, User,
};
use crate::registry::{AdminEntry, AdminRegistry, Capability};
use crate::response;

use crate::registry::Capability::{Create, Delete, Edit, List, View};

/// Build the registry of admin-exposed entities. Called exactly once at
/// startup; a duplicate name is a startup error, never a silent
/// overwrite.
pub fn default_registry() -> Result<AdminRegistry> {
    let mut registry = AdminRegistry::new();
    registry.register::<User>("user", &[List, View, Edit, Delete])?;
    registry.register::<Organization>("organization", &[List, View, Edit, Delete])?;
    registry.register::<Project>("project", &[List, View, Edit, Delete])?;
    registry.register::<Subscription>("subscription", &[List, View, Edit])?;
    registry.register::<Invitation>("invitation", &[List, View, Delete])?;
    registry.register::<Plan>("plan", &[List, View, Edit, Create, Delete])?;
    registry.register::<Setting>("setting", &[List, View, Edit, Create, Delete])?;
    Ok(registry)
}

fn lookup<'a>(state: &'a AppState, name: &str, capability: Capability) -> Result<&'a AdminEntry> {
    let entry = state
        .admin
        .get(name)
        .ok_or_else(|| AppError::NotFound(msg::RESOURCE_NOT_FOUND.into()))?;
    if !entry.can(capability) {
        return Err(AppError::Forbidden(format!(
            "Resource '{}' does not support this operation",
            name
        )));
    }
    Ok(entry)
}

/// Metadata for every registered resource.
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let mut resources = Map::new();
    for (name, entry) in state.admin.iter() {
        resources.insert(name.clone(), serde_json::to_value(&entry.meta)?);
    }
    Ok(response::ok(json!({ "resources": resources })))
}

/// All rows of one resource, with its metadata.
pub async fn get_resource_data(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(resource): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let entry = lookup(&state, &resource, Capability::List)?;
    let items = entry.list(&conn)?;
    Ok(response::ok(json!({
        "items": items,
        "metadata": serde_json::to_value(&entry.meta)?,
    })))
}

pub async fn get_resource_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let entry = lookup(&state, &resource, Capability::View)?;
    let item = entry.get(&conn, &id)?;
    Ok(response::ok(json!({ "item": item })))
}

/// Apply a JSON patch to the editable fields of one row. System and
/// unknown keys are ignored.
pub async fn update_resource_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let entry = lookup(&state, &resource, Capability::Edit)?;
    let item = entry.update(&conn, &id, &patch)?;
    Ok(response::message(
        &format!("{} updated successfully", resource),
        Some(json!({ "item": item })),
    ))
}

pub async fn delete_resource_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let entry = lookup(&state, &resource, Capability::Delete)?;
    entry.delete(&conn, &id)?;
    Ok(response::message(
        &format!("{} deleted successfully", resource),
        None,
    ))
}

/// Headline counts for the admin dashboard.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let count = |name: &str| -> Result<i64> {
        state
            .admin
            .get(name)
            .ok_or_else(|| AppError::Internal(format!("Resource '{}' not registered", name)))?
            .count(&conn)
    };

    Ok(response::ok(json!({
        "stats": {
            "users": count("user")?,
            "organizations": count("organization")?,
            "projects": count("project")?,
            "activeProjects":
                crate::db::queries::count_projects_with_status(&conn, ProjectStatus::Active)?,
        }
    })))
}
