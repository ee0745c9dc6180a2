use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::ORGANIZATION_COLS;
use crate::error::{msg, AppError, Result};
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::{set_if_present, ApplyUpdate, Resource};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Globally unique, URL-safe identifier derived from the name.
    pub slug: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl Organization {
    pub fn new(name: String, slug: String, description: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            slug,
            description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    pub name: String,
    /// Optional custom slug base; the generated slug still gets a numeric
    /// suffix if taken.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateOrganization {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ApplyUpdate<UpdateOrganization> for Organization {
    fn apply_update(&mut self, update: &UpdateOrganization) {
        set_if_present(&mut self.name, &update.name);
        set_if_present(&mut self.description, &update.description);
    }
}

impl Resource for Organization {
    const TABLE: &'static str = "organizations";
    const COLS: &'static str = ORGANIZATION_COLS;
    const NAME: &'static str = "organization";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("name", self.name.clone().into()),
            ("slug", self.slug.clone().into()),
            ("description", self.description.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", self.name.clone().into()),
            ("slug", self.slug.clone().into()),
            ("description", self.description.clone().into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl AdminResource for Organization {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "name", kind: FieldKind::String, required: true },
        FieldSpec { name: "slug", kind: FieldKind::String, required: true },
        FieldSpec { name: "description", kind: FieldKind::String, required: false },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
