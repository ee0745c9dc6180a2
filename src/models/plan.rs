use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::PLAN_COLS;
use crate::error::{msg, AppError, Result};
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::{set_if_present, ApplyUpdate, Resource};

/// Plan implicitly held by organizations without a subscription row.
pub const FREE_PLAN: &str = "free";

/// Catalog entity: pricing, limits (-1 = unlimited), feature flags.
/// Administrator-managed; not user-mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub monthly_price: f64,
    pub yearly_price: f64,
    pub stripe_price_id_monthly: String,
    pub stripe_price_id_yearly: String,
    pub max_organizations: i64,
    pub max_projects: i64,
    pub max_members: i64,
    pub has_priority_support: bool,
    pub has_advanced_features: bool,
    pub has_custom_integrations: bool,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlan {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub monthly_price: f64,
    #[serde(default)]
    pub yearly_price: f64,
    #[serde(default)]
    pub stripe_price_id_monthly: String,
    #[serde(default)]
    pub stripe_price_id_yearly: String,
    #[serde(default = "unlimited")]
    pub max_organizations: i64,
    #[serde(default = "unlimited")]
    pub max_projects: i64,
    #[serde(default = "unlimited")]
    pub max_members: i64,
    #[serde(default)]
    pub has_priority_support: bool,
    #[serde(default)]
    pub has_advanced_features: bool,
    #[serde(default)]
    pub has_custom_integrations: bool,
    #[serde(default)]
    pub sort_order: i64,
}

fn unlimited() -> i64 {
    -1
}

impl CreatePlan {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.display_name.trim().is_empty() {
            return Err(AppError::Validation(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }

    pub fn build(&self) -> Plan {
        let now = chrono::Utc::now().timestamp();
        Plan {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            monthly_price: self.monthly_price,
            yearly_price: self.yearly_price,
            stripe_price_id_monthly: self.stripe_price_id_monthly.clone(),
            stripe_price_id_yearly: self.stripe_price_id_yearly.clone(),
            max_organizations: self.max_organizations,
            max_projects: self.max_projects,
            max_members: self.max_members,
            has_priority_support: self.has_priority_support,
            has_advanced_features: self.has_advanced_features,
            has_custom_integrations: self.has_custom_integrations,
            is_active: true,
            sort_order: self.sort_order,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlan {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub monthly_price: Option<f64>,
    pub yearly_price: Option<f64>,
    pub stripe_price_id_monthly: Option<String>,
    pub stripe_price_id_yearly: Option<String>,
    pub max_organizations: Option<i64>,
    pub max_projects: Option<i64>,
    pub max_members: Option<i64>,
    pub has_priority_support: Option<bool>,
    pub has_advanced_features: Option<bool>,
    pub has_custom_integrations: Option<bool>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl ApplyUpdate<UpdatePlan> for Plan {
    fn apply_update(&mut self, update: &UpdatePlan) {
        set_if_present(&mut self.display_name, &update.display_name);
        set_if_present(&mut self.description, &update.description);
        set_if_present(&mut self.stripe_price_id_monthly, &update.stripe_price_id_monthly);
        set_if_present(&mut self.stripe_price_id_yearly, &update.stripe_price_id_yearly);
        if let Some(v) = update.monthly_price {
            self.monthly_price = v;
        }
        if let Some(v) = update.yearly_price {
            self.yearly_price = v;
        }
        if let Some(v) = update.max_organizations {
            self.max_organizations = v;
        }
        if let Some(v) = update.max_projects {
            self.max_projects = v;
        }
        if let Some(v) = update.max_members {
            self.max_members = v;
        }
        if let Some(v) = update.has_priority_support {
            self.has_priority_support = v;
        }
        if let Some(v) = update.has_advanced_features {
            self.has_advanced_features = v;
        }
        if let Some(v) = update.has_custom_integrations {
            self.has_custom_integrations = v;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        if let Some(v) = update.sort_order {
            self.sort_order = v;
        }
    }
}

impl Resource for Plan {
    const TABLE: &'static str = "plans";
    const COLS: &'static str = PLAN_COLS;
    const NAME: &'static str = "plan";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("name", self.name.clone().into()),
            ("display_name", self.display_name.clone().into()),
            ("description", self.description.clone().into()),
            ("monthly_price", self.monthly_price.into()),
            ("yearly_price", self.yearly_price.into()),
            ("stripe_price_id_monthly", self.stripe_price_id_monthly.clone().into()),
            ("stripe_price_id_yearly", self.stripe_price_id_yearly.clone().into()),
            ("max_organizations", self.max_organizations.into()),
            ("max_projects", self.max_projects.into()),
            ("max_members", self.max_members.into()),
            ("has_priority_support", (self.has_priority_support as i64).into()),
            ("has_advanced_features", (self.has_advanced_features as i64).into()),
            ("has_custom_integrations", (self.has_custom_integrations as i64).into()),
            ("is_active", (self.is_active as i64).into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("display_name", self.display_name.clone().into()),
            ("description", self.description.clone().into()),
            ("monthly_price", self.monthly_price.into()),
            ("yearly_price", self.yearly_price.into()),
            ("stripe_price_id_monthly", self.stripe_price_id_monthly.clone().into()),
            ("stripe_price_id_yearly", self.stripe_price_id_yearly.clone().into()),
            ("max_organizations", self.max_organizations.into()),
            ("max_projects", self.max_projects.into()),
            ("max_members", self.max_members.into()),
            ("has_priority_support", (self.has_priority_support as i64).into()),
            ("has_advanced_features", (self.has_advanced_features as i64).into()),
            ("has_custom_integrations", (self.has_custom_integrations as i64).into()),
            ("is_active", (self.is_active as i64).into()),
            ("sort_order", self.sort_order.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl AdminResource for Plan {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "name", kind: FieldKind::String, required: true },
        FieldSpec { name: "displayName", kind: FieldKind::String, required: true },
        FieldSpec { name: "description", kind: FieldKind::String, required: false },
        FieldSpec { name: "monthlyPrice", kind: FieldKind::Float, required: true },
        FieldSpec { name: "yearlyPrice", kind: FieldKind::Float, required: true },
        FieldSpec { name: "stripePriceIdMonthly", kind: FieldKind::String, required: false },
        FieldSpec { name: "stripePriceIdYearly", kind: FieldKind::String, required: false },
        FieldSpec { name: "maxOrganizations", kind: FieldKind::Int, required: false },
        FieldSpec { name: "maxProjects", kind: FieldKind::Int, required: false },
        FieldSpec { name: "maxMembers", kind: FieldKind::Int, required: false },
        FieldSpec { name: "hasPrioritySupport", kind: FieldKind::Bool, required: false },
        FieldSpec { name: "hasAdvancedFeatures", kind: FieldKind::Bool, required: false },
        FieldSpec { name: "hasCustomIntegrations", kind: FieldKind::Bool, required: false },
        FieldSpec { name: "isActive", kind: FieldKind::Bool, required: false },
        FieldSpec { name: "sortOrder", kind: FieldKind::Int, required: false },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
