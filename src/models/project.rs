use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::PROJECT_COLS;
use crate::error::{msg, AppError, Result};
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::{set_if_present, ApplyUpdate, OrgScoped, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Inactive,
    Pending,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
            ProjectStatus::Pending => "pending",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "inactive" => Ok(ProjectStatus::Inactive),
            "pending" => Ok(ProjectStatus::Pending),
            "completed" => Ok(ProjectStatus::Completed),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl Project {
    pub fn new(organization_id: String, name: String, description: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id,
            name,
            description,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub organization_id: String,
}

impl CreateProject {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ApplyUpdate<UpdateProject> for Project {
    fn apply_update(&mut self, update: &UpdateProject) {
        set_if_present(&mut self.name, &update.name);
        set_if_present(&mut self.description, &update.description);
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

impl Resource for Project {
    const TABLE: &'static str = "projects";
    const COLS: &'static str = PROJECT_COLS;
    const NAME: &'static str = "project";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("organization_id", self.organization_id.clone().into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("status", self.status.as_str().to_string().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("status", self.status.as_str().to_string().into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OrgScoped for Project {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

impl AdminResource for Project {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "organizationId", kind: FieldKind::String, required: true },
        FieldSpec { name: "name", kind: FieldKind::String, required: true },
        FieldSpec { name: "description", kind: FieldKind::String, required: false },
        FieldSpec { name: "status", kind: FieldKind::String, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
