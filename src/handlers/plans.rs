//! Plan catalog: public listing plus admin-only management.

use axum::{extract::State, response::Response, Extension};
use serde_json::json;

use crate::authz;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthUser;
use crate::models::{CreatePlan, Plan, UpdatePlan};
use crate::resource;
use crate::response;

/// Active plans, public. Pricing pages read this.
pub async fn list_public_plans(State(state): State<AppState>) -> Result<Response> {
    let conn = state.db.get()?;
    let plans = queries::list_active_plans(&conn)?;
    Ok(response::ok(json!({ "plans": plans })))
}

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreatePlan>,
) -> Result<Response> {
    input.validate()?;

    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    if queries::plan_name_taken(&conn, &input.name)? {
        return Err(AppError::Conflict("Plan with this name already exists".into()));
    }

    let plan = input.build();
    resource::insert(&conn, &plan)?;

    Ok(response::created(
        "Plan created successfully",
        json!({ "plan": plan }),
    ))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePlan>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let plan = resource::update::<Plan, _>(&conn, &id, &input)?;

    Ok(response::message(
        "Plan updated successfully",
        Some(json!({ "plan": plan })),
    ))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    resource::delete::<Plan>(&conn, &id)?;
    Ok(response::message("Plan deleted successfully", None))
}
