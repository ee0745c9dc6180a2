use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::USER_COLS;
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: UserRole,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            first_name,
            last_name,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl Resource for User {
    const TABLE: &'static str = "users";
    const COLS: &'static str = USER_COLS;
    const NAME: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("email", self.email.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("role", self.role.as_str().to_string().into()),
            ("is_active", (self.is_active as i64).into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("email", self.email.clone().into()),
            ("password_hash", self.password_hash.clone().into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("role", self.role.as_str().to_string().into()),
            ("is_active", (self.is_active as i64).into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl AdminResource for User {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "email", kind: FieldKind::String, required: true },
        FieldSpec { name: "firstName", kind: FieldKind::String, required: false },
        FieldSpec { name: "lastName", kind: FieldKind::String, required: false },
        FieldSpec { name: "role", kind: FieldKind::String, required: true },
        FieldSpec { name: "isActive", kind: FieldKind::Bool, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];

    fn restore_hidden(&mut self, prev: &Self) {
        // password_hash is never serialized, so a round-trip edit would
        // otherwise blank it.
        self.password_hash = prev.password_hash.clone();
    }
}
