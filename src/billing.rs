//! Subscription and plan domain logic: period arithmetic, the derived
//! `expired` status, and plan limit/feature checks.

use chrono::{Months, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{BillingPeriod, Plan, Subscription, SubscriptionStatus};

/// Build a new active subscription for an organization. Provider ids are
/// attached by the caller once checkout completes.
pub fn new_subscription(
    organization_id: &str,
    plan_name: &str,
    billing_period: BillingPeriod,
) -> Subscription {
    let start = Utc::now();
    let end = match billing_period {
        BillingPeriod::Monthly => start + Months::new(1),
        BillingPeriod::Yearly => start + Months::new(12),
    };
    let now = start.timestamp();

    Subscription {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        plan_name: plan_name.to_string(),
        status: SubscriptionStatus::Active,
        billing_period,
        start_date: now,
        end_date: end.timestamp(),
        stripe_customer_id: None,
        stripe_subscription_id: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn is_subscription_active(subscription: &Subscription, now: i64) -> bool {
    subscription.status == SubscriptionStatus::Active && now < subscription.end_date
}

/// Status as reported to clients: a stored-active row past its end date
/// reads as "expired" without being rewritten.
pub fn effective_status(subscription: &Subscription, now: i64) -> &'static str {
    if subscription.status == SubscriptionStatus::Active && now >= subscription.end_date {
        "expired"
    } else {
        subscription.status.as_str()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LimitKind {
    Organizations,
    Projects,
    Members,
}

/// Whether an action is within the plan's limit. -1 means unlimited.
pub fn check_limit(plan: &Plan, kind: LimitKind, current_count: i64) -> bool {
    let limit = match kind {
        LimitKind::Organizations => plan.max_organizations,
        LimitKind::Projects => plan.max_projects,
        LimitKind::Members => plan.max_members,
    };
    limit == -1 || current_count < limit
}

/// Whether the organization's subscription grants a named feature.
/// Inactive or expired subscriptions grant nothing.
pub fn can_access_feature(
    conn: &Connection,
    subscription: Option<&Subscription>,
    feature: &str,
) -> Result<bool> {
    let Some(subscription) = subscription else {
        return Ok(false);
    };
    if !is_subscription_active(subscription, Utc::now().timestamp()) {
        return Ok(false);
    }

    let Some(plan) = queries::get_active_plan_by_name(conn, &subscription.plan_name)? else {
        return Ok(false);
    };

    Ok(match feature {
        "priority_support" => plan.has_priority_support,
        "advanced_features" => plan.has_advanced_features,
        "custom_integrations" => plan.has_custom_integrations,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_limits(max_projects: i64) -> Plan {
        Plan {
            id: "p1".into(),
            name: "pro".into(),
            display_name: "Pro".into(),
            description: String::new(),
            monthly_price: 29.0,
            yearly_price: 290.0,
            stripe_price_id_monthly: String::new(),
            stripe_price_id_yearly: String::new(),
            max_organizations: -1,
            max_projects,
            max_members: 5,
            has_priority_support: true,
            has_advanced_features: false,
            has_custom_integrations: false,
            is_active: true,
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    #[test]
    fn test_check_limit_unlimited_and_bounded() {
        let plan = plan_with_limits(3);
        assert!(check_limit(&plan, LimitKind::Organizations, 10_000));
        assert!(check_limit(&plan, LimitKind::Projects, 2));
        assert!(!check_limit(&plan, LimitKind::Projects, 3));
        assert!(!check_limit(&plan, LimitKind::Members, 5));
    }

    #[test]
    fn test_effective_status_derives_expired() {
        let mut sub = new_subscription("org1", "pro", BillingPeriod::Monthly);
        let now = Utc::now().timestamp();

        assert_eq!(effective_status(&sub, now), "active");
        assert_eq!(effective_status(&sub, sub.end_date + 1), "expired");

        // Non-active statuses report themselves even past the end date.
        sub.status = SubscriptionStatus::Cancelled;
        assert_eq!(effective_status(&sub, sub.end_date + 1), "cancelled");
        sub.status = SubscriptionStatus::PastDue;
        assert_eq!(effective_status(&sub, now), "past_due");
    }

    #[test]
    fn test_new_subscription_periods() {
        let monthly = new_subscription("org1", "pro", BillingPeriod::Monthly);
        let yearly = new_subscription("org1", "pro", BillingPeriod::Yearly);

        let month = monthly.end_date - monthly.start_date;
        assert!((28 * 86400..=31 * 86400).contains(&month));

        let year = yearly.end_date - yearly.start_date;
        assert!((365 * 86400..=366 * 86400).contains(&year));
    }
}
