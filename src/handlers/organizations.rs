//! Organization CRUD. Creation auto-adds the creator as a member; every
//! other operation requires membership of the target organization.

use axum::{extract::State, response::Response, Extension};
use serde_json::json;

use crate::authz;
use crate::db::{queries, AppState};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{CreateOrganization, Organization, UpdateOrganization};
use crate::resource;
use crate::response;

pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let organizations = queries::list_organizations_for_user(&conn, &auth.user_id)?;
    Ok(response::ok(json!({ "organizations": organizations })))
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateOrganization>,
) -> crate::error::Result<Response> {
    input.validate()?;

    let mut conn = state.db.get()?;
    let organization = queries::create_organization(&mut conn, &input, &auth.user_id)?;

    Ok(response::created(
        "Organization created successfully",
        json!({ "organization": organization }),
    ))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let organization = resource::fetch::<Organization>(&conn, &id)?;
    authz::require_membership(&conn, &auth.user_id, &organization.id)?;

    Ok(response::ok(json!({ "organization": organization })))
}

pub async fn update_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdateOrganization>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let organization = resource::fetch::<Organization>(&conn, &id)?;
    authz::require_membership(&conn, &auth.user_id, &organization.id)?;

    let organization = resource::update::<Organization, _>(&conn, &id, &input)?;
    Ok(response::message(
        "Organization updated successfully",
        Some(json!({ "organization": organization })),
    ))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> crate::error::Result<Response> {
    let conn = state.db.get()?;
    let organization = resource::fetch::<Organization>(&conn, &id)?;
    authz::require_membership(&conn, &auth.user_id, &organization.id)?;

    resource::delete::<Organization>(&conn, &id)?;
    Ok(response::message("Organization deleted successfully", None))
}
