//! Project CRUD through the generic resource engine. Projects inherit
//! access from their owning organization.

use axum::{extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::json;

use crate::authz;
use crate::db::AppState;
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthUser;
use crate::models::{CreateProject, Project, UpdateProject};
use crate::resource;
use crate::response;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsQuery {
    pub organization_id: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListProjectsQuery>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;

    // An explicit organization filter must itself pass the membership
    // check before it narrows the scoped query.
    if let Some(org_id) = query.organization_id.as_deref() {
        authz::require_membership(&conn, &auth.user_id, org_id)?;
    }

    let projects = resource::list_for_member::<Project>(
        &conn,
        &auth.user_id,
        query.organization_id.as_deref(),
    )?;
    Ok(response::ok(json!({ "projects": projects })))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateProject>,
) -> crate::error::Result<Response> {
    input.validate()?;

    let conn = state.db.get()?;
    let project = resource::create(&conn, &input, &auth.user_id, |conn, req: &CreateProject, user_id| {
        authz::require_membership(conn, user_id, &req.organization_id)?;
        Ok(Project::new(
            req.organization_id.clone(),
            req.name.clone(),
            req.description.clone().unwrap_or_default(),
        ))
    })?;

    Ok(response::created(
        "Project created successfully",
        json!({ "project": project }),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let project = resource::fetch::<Project>(&conn, &id)?;
    authz::require_project_access(&conn, &auth.user_id, &project)?;

    Ok(response::ok(json!({ "project": project })))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProject>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let project = resource::fetch::<Project>(&conn, &id)?;
    authz::require_project_access(&conn, &auth.user_id, &project)?;

    let project = resource::update::<Project, _>(&conn, &id, &input)?;
    Ok(response::message(
        "Project updated successfully",
        Some(json!({ "project": project })),
    ))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let project = resource::fetch::<Project>(&conn, &id)?;
    authz::require_project_access(&conn, &auth.user_id, &project)?;

    resource::delete::<Project>(&conn, &id)?;
    Ok(response::message("Project deleted successfully", None))
}
