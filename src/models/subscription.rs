use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::from_row::SUBSCRIPTION_COLS;
use crate::registry::{AdminResource, FieldKind, FieldSpec};
use crate::resource::{OrgScoped, Resource};

/// Stored subscription statuses. `expired` is a derived, read-time view of
/// a stored-active row whose end date has passed; it is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Map a payment-provider status string onto the local status set.
    /// Returns None for statuses with no local equivalent, in which case
    /// the stored status is left untouched.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "active" | "trialing" => Some(SubscriptionStatus::Active),
            "past_due" | "unpaid" | "incomplete" => Some(SubscriptionStatus::PastDue),
            "canceled" | "cancelled" | "incomplete_expired" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for BillingPeriod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingPeriod::Monthly),
            "yearly" => Ok(BillingPeriod::Yearly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub organization_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub billing_period: BillingPeriod,
    pub start_date: i64,
    pub end_date: i64,
    /// Provider identifiers, attached once checkout completes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stripe_subscription_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<i64>,
}

impl Resource for Subscription {
    const TABLE: &'static str = "subscriptions";
    const COLS: &'static str = SUBSCRIPTION_COLS;
    const NAME: &'static str = "subscription";

    fn id(&self) -> &str {
        &self.id
    }

    fn insert_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.clone().into()),
            ("organization_id", self.organization_id.clone().into()),
            ("plan_name", self.plan_name.clone().into()),
            ("status", self.status.as_str().to_string().into()),
            ("billing_period", self.billing_period.as_str().to_string().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("stripe_customer_id", self.stripe_customer_id.clone().into()),
            ("stripe_subscription_id", self.stripe_subscription_id.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn update_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("plan_name", self.plan_name.clone().into()),
            ("status", self.status.as_str().to_string().into()),
            ("billing_period", self.billing_period.as_str().to_string().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("stripe_customer_id", self.stripe_customer_id.clone().into()),
            ("stripe_subscription_id", self.stripe_subscription_id.clone().into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }
}

impl OrgScoped for Subscription {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

impl AdminResource for Subscription {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec { name: "id", kind: FieldKind::String, required: true },
        FieldSpec { name: "organizationId", kind: FieldKind::String, required: true },
        FieldSpec { name: "planName", kind: FieldKind::String, required: true },
        FieldSpec { name: "status", kind: FieldKind::String, required: true },
        FieldSpec { name: "billingPeriod", kind: FieldKind::String, required: true },
        FieldSpec { name: "startDate", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "endDate", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        FieldSpec { name: "updatedAt", kind: FieldKind::Timestamp, required: true },
    ];
}
