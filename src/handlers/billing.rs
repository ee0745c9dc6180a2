//! Billing surface: checkout, subscription status, user-initiated
//! cancellation, and the provider billing portal.

use axum::{extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::json;

use crate::authz;
use crate::billing;
use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthUser;
use crate::models::{BillingPeriod, Subscription, SubscriptionStatus, User, FREE_PLAN};
use crate::payments::CheckoutMetadata;
use crate::resource;
use crate::response;

/// Subscriptions across the caller's organizations.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let subscriptions = resource::list_for_member::<Subscription>(&conn, &auth.user_id, None)?;
    Ok(response::ok(json!({ "subscriptions": subscriptions })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan_name: String,
    pub billing_interval: String,
    pub organization_id: String,
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CheckoutRequest>,
) -> Result<Response> {
    if input.plan_name == FREE_PLAN {
        return Err(AppError::Validation(msg::FREE_PLAN_NO_CHECKOUT.into()));
    }
    let period: BillingPeriod = input
        .billing_interval
        .parse()
        .map_err(|_| AppError::Validation("billingInterval must be monthly or yearly".into()))?;

    let conn = state.db.get()?;
    let user = resource::fetch::<User>(&conn, &auth.user_id)?;
    authz::require_membership(&conn, &auth.user_id, &input.organization_id)?;

    let plan = queries::get_active_plan_by_name(&conn, &input.plan_name)?
        .or_not_found(msg::PLAN_NOT_FOUND)?;
    let price_id = match period {
        BillingPeriod::Monthly => &plan.stripe_price_id_monthly,
        BillingPeriod::Yearly => &plan.stripe_price_id_yearly,
    };
    if price_id.is_empty() {
        return Err(AppError::Validation(format!(
            "No {} price configured for this plan",
            period.as_str()
        )));
    }

    let success_url = format!(
        "{}/billing/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.base_url
    );
    let cancel_url = format!("{}/billing", state.base_url);

    let (session_id, session_url) = state
        .stripe
        .create_subscription_checkout(
            &user.email,
            price_id,
            &success_url,
            &cancel_url,
            &CheckoutMetadata {
                organization_id: input.organization_id.clone(),
                plan_name: input.plan_name.clone(),
                billing_period: period.as_str().to_string(),
            },
        )
        .await?;

    Ok(response::message(
        "Checkout session created",
        Some(json!({ "sessionId": session_id, "sessionUrl": session_url })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusQuery {
    pub organization_id: Option<String>,
}

/// An organization with no subscription row is on the free plan, active.
pub async fn get_subscription_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SubscriptionStatusQuery>,
) -> Result<Response> {
    let organization_id = query
        .organization_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation(msg::ORG_ID_REQUIRED.into()))?;

    let conn = state.db.get()?;
    authz::require_membership(&conn, &auth.user_id, organization_id)?;

    let Some(subscription) = queries::get_subscription_for_org(&conn, organization_id)? else {
        return Ok(response::ok(json!({
            "plan": FREE_PLAN,
            "status": "active",
            "billingPeriod": BillingPeriod::Monthly.as_str(),
        })));
    };

    let now = chrono::Utc::now().timestamp();
    Ok(response::ok(json!({
        "plan": subscription.plan_name,
        "status": billing::effective_status(&subscription, now),
        "billingPeriod": subscription.billing_period.as_str(),
        "endDate": subscription.end_date,
    })))
}

/// Cancel with the provider first; a provider failure aborts before any
/// local state changes.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let mut subscription = resource::fetch::<Subscription>(&conn, &id)?;
    authz::require_membership(&conn, &auth.user_id, &subscription.organization_id)?;

    if let Some(provider_id) = subscription.stripe_subscription_id.clone() {
        state.stripe.cancel_subscription(&provider_id).await?;
    }

    subscription.status = SubscriptionStatus::Cancelled;
    resource::save(&conn, &mut subscription)?;

    Ok(response::message(
        "Subscription cancelled",
        Some(json!({ "subscription": subscription })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRequest {
    pub organization_id: String,
}

/// Billing-portal session for the organization's provider customer.
pub async fn create_portal_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<PortalRequest>,
) -> Result<Response> {
    let conn = state.db.get()?;
    authz::require_membership(&conn, &auth.user_id, &input.organization_id)?;

    let subscription = queries::get_subscription_for_org(&conn, &input.organization_id)?
        .or_not_found(msg::SUBSCRIPTION_NOT_FOUND)?;
    let customer_id = subscription
        .stripe_customer_id
        .as_deref()
        .ok_or_else(|| AppError::Validation(msg::NO_BILLING_ACCOUNT.into()))?;

    let return_url = format!("{}/billing", state.base_url);
    let portal_url = state
        .stripe
        .create_portal_session(customer_id, &return_url)
        .await?;

    Ok(response::ok(json!({ "portalUrl": portal_url })))
}
