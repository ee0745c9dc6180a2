use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::INVITATION_COLS;
use crate::error::{msg, AppError, Result};
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::{OrgScoped, Resource};

/// How long an invitation stays acceptable.
pub const INVITATION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        }
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            _ => Err(()),
        }
    }
}

/// An offer for an email address (not necessarily a registered user yet)
/// to join an organization. A pending invitation past `expires_at` is
/// unusable but keeps its `pending` label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub organization_id: String,
    pub inviter_id: String,
    pub email: String,
    pub status: InvitationStatus,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl Invitation {
    pub fn new(organization_id: String, inviter_id: String, email: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id,
            inviter_id,
            email,
            status: InvitationStatus::Pending,
            expires_at: now + INVITATION_TTL_SECS,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitation {
    pub email: String,
    pub organization_id: String,
}

impl CreateInvitation {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::Validation(msg::EMAIL_INVALID.into()));
        }
        if self.organization_id.trim().is_empty() {
            return Err(AppError::Validation(msg::ORG_ID_REQUIRED.into()));
        }
        Ok(())
    }
}

impl Resource for Invitation {
    const TABLE: &'static str = "invitations";
    const COLS: &'static str = INVITATION_COLS;
    const NAME: &'static str = "invitation";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("organization_id", self.organization_id.clone().into()),
            ("inviter_id", self.inviter_id.clone().into()),
            ("email", self.email.clone().into()),
            ("status", self.status.as_str().to_string().into()),
            ("expires_at", self.expires_at.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("status", self.status.as_str().to_string().into()),
            ("expires_at", self.expires_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OrgScoped for Invitation {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

impl AdminResource for Invitation {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "organizationId", kind: FieldKind::String, required: true },
        FieldSpec { name: "inviterId", kind: FieldKind::String, required: true },
        FieldSpec { name: "email", kind: FieldKind::String, required: true },
        FieldSpec { name: "status", kind: FieldKind::String, required: true },
        FieldSpec { name: "expiresAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
