//! Settings: a public key/value view plus admin-only read/upsert.

use std::collections::BTreeMap;

use axum::{extract::State, response::Response, Extension};
use serde_json::json;

use crate::authz;
use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::AuthUser;
use crate::models::Setting;
use crate::resource;
use crate::response;

/// Public settings as a flat key -> value map.
pub async fn get_public_settings(State(state): State<AppState>) -> Result<Response> {
    let conn = state.db.get()?;
    let settings = queries::list_public_settings(&conn)?;

    let map: BTreeMap<String, String> =
        settings.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(response::message(
        "Public settings retrieved",
        Some(json!({ "settings": map })),
    ))
}

/// Every setting, admin only.
pub async fn get_all_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    let settings = resource::list_all::<Setting>(&conn)?;
    let map: BTreeMap<String, String> =
        settings.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(response::message(
        "Settings retrieved",
        Some(json!({ "settings": map })),
    ))
}

/// Upsert a batch of key -> value pairs. Unknown keys are created as
/// non-public general settings.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<BTreeMap<String, String>>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_admin(&conn, &auth.user_id)?;

    for (key, value) in input.iter() {
        match queries::get_setting_by_key(&conn, key)? {
            Some(mut setting) => {
                setting.value = value.clone();
                resource::save(&conn, &mut setting)?;
            }
            None => {
                let setting =
                    Setting::new(key.clone(), value.clone(), "general".to_string(), false);
                resource::insert(&conn, &setting)?;
            }
        }
    }

    Ok(response::message("Settings updated successfully", None))
}
