//! Payment-provider webhook ingestion.
//!
//! The signature is verified before the payload is trusted. Event
//! processing is best-effort: a malformed or unmatched event is logged
//! and the endpoint still acknowledges, since the provider redelivers on
//! non-2xx and a permanently bad event would otherwise retry forever.
//! Delivery order is not enforced; out-of-order events can regress
//! subscription state.

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};

use crate::billing;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{BillingPeriod, SubscriptionStatus};
use crate::payments::{
    StripeCheckoutSession, StripeInvoiceObject, StripeSubscriptionObject, StripeWebhookEvent,
};
use crate::resource;
use crate::response;

pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing stripe-signature header".into()))?;

    if !state.stripe.verify_webhook_signature(&body, signature)? {
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let event: StripeWebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

    match event.event_type.as_str() {
        "checkout.session.completed" => handle_checkout_completed(&state, &event),
        "customer.subscription.updated" => handle_subscription_updated(&state, &event),
        "customer.subscription.deleted" => handle_subscription_deleted(&state, &event),
        "invoice.payment_succeeded" => handle_payment_succeeded(&state, &event),
        "invoice.payment_failed" => handle_payment_failed(&state, &event).await,
        other => {
            tracing::debug!("Ignoring webhook event type {}", other);
        }
    }

    Ok(response::message("Webhook received", None))
}

fn handle_checkout_completed(state: &AppState, event: &StripeWebhookEvent) {
    let session: StripeCheckoutSession = match serde_json::from_value(event.data.object.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to parse checkout session: {}", e);
            return;
        }
    };

    let Some(organization_id) = session.metadata.organization_id else {
        tracing::warn!("Checkout session {} has no organization metadata", session.id);
        return;
    };
    let Some(plan_name) = session.metadata.plan_name else {
        tracing::warn!("Checkout session {} has no plan metadata", session.id);
        return;
    };
    let period = session
        .metadata
        .billing_period
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(BillingPeriod::Monthly);

    let mut subscription = billing::new_subscription(&organization_id, &plan_name, period);
    subscription.stripe_customer_id = session.customer;
    subscription.stripe_subscription_id = session.subscription;

    let result = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| resource::insert(&conn, &subscription));
    match result {
        Ok(()) => tracing::info!(
            "Subscription {} created for organization {} (plan {})",
            subscription.id,
            organization_id,
            plan_name
        ),
        Err(e) => tracing::error!("Failed to store subscription from checkout: {}", e),
    }
}

fn handle_subscription_updated(state: &AppState, event: &StripeWebhookEvent) {
    let object: StripeSubscriptionObject = match serde_json::from_value(event.data.object.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to parse subscription event: {}", e);
            return;
        }
    };

    let result = (|| -> Result<()> {
        let conn = state.db.get()?;
        let Some(mut subscription) = queries::get_subscription_by_provider_id(&conn, &object.id)?
        else {
            tracing::warn!("No subscription for provider id {}", object.id);
            return Ok(());
        };

        // Provider status is copied as-is, without forward-only
        // validation; statuses outside the local set leave the stored
        // status untouched.
        match SubscriptionStatus::from_provider(&object.status) {
            Some(status) => subscription.status = status,
            None => tracing::warn!(
                "Unmapped provider status '{}' for subscription {}",
                object.status,
                subscription.id
            ),
        }
        if let Some(period_end) = object.current_period_end {
            subscription.end_date = period_end;
        }
        resource::save(&conn, &mut subscription)
    })();

    if let Err(e) = result {
        tracing::error!("Failed to apply subscription update: {}", e);
    }
}

fn handle_subscription_deleted(state: &AppState, event: &StripeWebhookEvent) {
    let object: StripeSubscriptionObject = match serde_json::from_value(event.data.object.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to parse subscription event: {}", e);
            return;
        }
    };

    let result = (|| -> Result<()> {
        let conn = state.db.get()?;
        let Some(mut subscription) = queries::get_subscription_by_provider_id(&conn, &object.id)?
        else {
            tracing::warn!("No subscription for provider id {}", object.id);
            return Ok(());
        };
        subscription.status = SubscriptionStatus::Cancelled;
        resource::save(&conn, &mut subscription)
    })();

    if let Err(e) = result {
        tracing::error!("Failed to apply subscription deletion: {}", e);
    }
}

fn handle_payment_succeeded(state: &AppState, event: &StripeWebhookEvent) {
    let invoice: StripeInvoiceObject = match serde_json::from_value(event.data.object.clone()) {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("Failed to parse invoice event: {}", e);
            return;
        }
    };
    let Some(provider_id) = invoice.subscription else {
        return;
    };

    let result = (|| -> Result<()> {
        let conn = state.db.get()?;
        let Some(mut subscription) = queries::get_subscription_by_provider_id(&conn, &provider_id)?
        else {
            tracing::warn!("No subscription for provider id {}", provider_id);
            return Ok(());
        };
        subscription.status = SubscriptionStatus::Active;
        if let Some(period_end) = invoice.period_end {
            subscription.end_date = period_end;
        }
        resource::save(&conn, &mut subscription)
    })();

    if let Err(e) = result {
        tracing::error!("Failed to apply payment success: {}", e);
    }
}

async fn handle_payment_failed(state: &AppState, event: &StripeWebhookEvent) {
    let invoice: StripeInvoiceObject = match serde_json::from_value(event.data.object.clone()) {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("Failed to parse invoice event: {}", e);
            return;
        }
    };
    let Some(provider_id) = invoice.subscription else {
        return;
    };

    let notify = (|| -> Result<Option<(String, String)>> {
        let conn = state.db.get()?;
        let Some(mut subscription) = queries::get_subscription_by_provider_id(&conn, &provider_id)?
        else {
            tracing::warn!("No subscription for provider id {}", provider_id);
            return Ok(None);
        };
        subscription.status = SubscriptionStatus::PastDue;
        resource::save(&conn, &mut subscription)?;

        let owner = queries::get_org_owner(&conn, &subscription.organization_id)?;
        Ok(owner.map(|u| (u.email, subscription.plan_name.clone())))
    })();

    match notify {
        Ok(Some((email, plan_name))) => {
            if let Err(e) = state.email.send_payment_failed(&email, &plan_name).await {
                tracing::warn!("Failed to send payment-failed email: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to apply payment failure: {}", e),
    }
}
