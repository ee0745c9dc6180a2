use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CreatePortalSessionResponse {
    url: String,
}

/// Metadata attached to checkout sessions so the completion webhook can
/// locate the organization and plan.
#[derive(Debug, Clone)]
pub struct CheckoutMetadata {
    pub organization_id: String,
    pub plan_name: String,
    pub billing_period: String,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            webhook_secret,
        }
    }

    /// Create a subscription-mode checkout session for a pre-configured
    /// price. Returns (session id, session url).
    pub async fn create_subscription_checkout(
        &self,
        customer_email: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
        metadata: &CheckoutMetadata,
    ) -> Result<(String, String)> {
        let response = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "subscription"),
                ("customer_email", customer_email),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("metadata[organization_id]", &metadata.organization_id),
                ("metadata[plan_name]", &metadata.plan_name),
                ("metadata[billing_period]", &metadata.billing_period),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CreateCheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid Stripe response: {}", e)))?;

        Ok((session.id, session.url))
    }

    /// Cancel a subscription with the provider.
    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "https://api.stripe.com/v1/subscriptions/{}",
                subscription_id
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        Ok(())
    }

    /// Create a billing-portal session for a customer; returns its URL.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post("https://api.stripe.com/v1/billing_portal/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CreatePortalSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid Stripe response: {}", e)))?;

        Ok(session.url)
    }

    /// Maximum age of a webhook timestamp before it's rejected (seconds).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        // Stripe signature format: t=timestamp,v1=signature
        let mut timestamp = None;
        let mut sig_v1 = None;

        for part in signature.split(',') {
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                sig_v1 = Some(s);
            }
        }

        let timestamp_str = timestamp
            .ok_or_else(|| AppError::Validation("Invalid signature format".into()))?;
        let sig_v1 =
            sig_v1.ok_or_else(|| AppError::Validation("Invalid signature format".into()))?;

        // Reject replayed or future-dated webhooks.
        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| AppError::Validation("Invalid timestamp in signature".into()))?;

        let age = chrono::Utc::now().timestamp() - timestamp;
        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
            tracing::warn!("Webhook rejected: timestamp too old (age={}s)", age);
            return Ok(false);
        }
        if age < -60 {
            tracing::warn!("Webhook rejected: timestamp in the future (age={}s)", age);
            return Ok(false);
        }

        let signed_payload = format!("{}.{}", timestamp_str, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison; signature length is not secret.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = sig_v1.as_bytes();
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }

    /// Compute a valid signature header for a payload. Test support.
    pub fn sign_payload(&self, payload: &[u8], timestamp: i64) -> String {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }
}

// ============ Webhook payloads ============

/// Generic webhook event; `data.object` is parsed per event type.
#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

// checkout.session.completed
#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: StripeSessionMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct StripeSessionMetadata {
    pub organization_id: Option<String>,
    pub plan_name: Option<String>,
    pub billing_period: Option<String>,
}

// customer.subscription.updated / deleted
#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionObject {
    pub id: String,
    pub status: String,
    pub current_period_end: Option<i64>,
}

// invoice.payment_succeeded / payment_failed
#[derive(Debug, Deserialize)]
pub struct StripeInvoiceObject {
    pub id: String,
    pub subscription: Option<String>,
    pub period_end: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_signature_roundtrip() {
        let client = StripeClient::new("sk_test".into(), "whsec_test".into());
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = chrono::Utc::now().timestamp();

        let header = client.sign_payload(payload, now);
        assert!(client.verify_webhook_signature(payload, &header).unwrap());

        // Tampered payload fails.
        assert!(!client
            .verify_webhook_signature(b"{\"type\":\"other\"}", &header)
            .unwrap());

        // Stale timestamp fails.
        let old = client.sign_payload(payload, now - 10_000);
        assert!(!client.verify_webhook_signature(payload, &old).unwrap());
    }

    #[test]
    fn test_malformed_signature_header_is_validation_error() {
        let client = StripeClient::new("sk_test".into(), "whsec_test".into());
        assert!(client.verify_webhook_signature(b"{}", "no-parts-here").is_err());
    }
}
