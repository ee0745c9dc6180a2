use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::SETTING_COLS;
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::Resource;

/// Key-value configuration row. Public settings are readable without
/// authentication; everything else is admin-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub id: String,
    pub key: String,
    pub value: String,
    pub category: String,
    pub is_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl Setting {
    pub fn new(key: String, value: String, category: String, is_public: bool) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key,
            value,
            category,
            is_public,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Resource for Setting {
    const TABLE: &'static str = "settings";
    const COLS: &'static str = SETTING_COLS;
    const NAME: &'static str = "setting";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("key", self.key.clone().into()),
            ("value", self.value.clone().into()),
            ("category", self.category.clone().into()),
            ("is_public", (self.is_public as i64).into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("value", self.value.clone().into()),
            ("category", self.category.clone().into()),
            ("is_public", (self.is_public as i64).into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl AdminResource for Setting {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "key", kind: FieldKind::String, required: true },
        FieldSpec { name: "value", kind: FieldKind::String, required: false },
        FieldSpec { name: "category", kind: FieldKind::String, required: false },
        FieldSpec { name: "isPublic", kind: FieldKind::Bool, required: false },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
