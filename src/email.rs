//! Outbound email delivery.
//!
//! Sends through a Resend-style HTTP API when an API key is configured,
//! otherwise logs and reports `Disabled`. Every caller treats delivery as
//! best-effort: failures are logged and swallowed, never surfaced to the
//! request that triggered them.

use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};

const EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSendResult {
    Sent,
    /// No API key configured; the message was logged instead.
    Disabled,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

pub struct EmailService {
    client: Client,
    api_key: Option<String>,
    from: String,
}

impl EmailService {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<EmailSendResult> {
        let Some(api_key) = &self.api_key else {
            tracing::info!("Email disabled, would send to {}: {}", to, subject);
            return Ok(EmailSendResult::Disabled);
        };

        let response = self
            .client
            .post(EMAIL_API_URL)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.from,
                to: [to],
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Email API error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Email API returned {}: {}",
                status, body
            )));
        }

        Ok(EmailSendResult::Sent)
    }

    pub async fn send_invitation(
        &self,
        to: &str,
        organization_name: &str,
        base_url: &str,
    ) -> Result<EmailSendResult> {
        let subject = format!("You've been invited to join {}", organization_name);
        let html = format!(
            "<p>You have been invited to join <strong>{}</strong>.</p>\
             <p>Sign in at <a href=\"{}\">{}</a> to accept or decline the invitation. \
             The invitation expires in 7 days.</p>",
            organization_name, base_url, base_url
        );
        self.send(to, &subject, &html).await
    }

    pub async fn send_password_reset(
        &self,
        to: &str,
        token: &str,
        base_url: &str,
    ) -> Result<EmailSendResult> {
        let link = format!("{}/reset-password?token={}", base_url, token);
        let html = format!(
            "<p>A password reset was requested for this address.</p>\
             <p><a href=\"{}\">Reset your password</a>. The link expires in one hour. \
             If you didn't request this, you can ignore this email.</p>",
            link
        );
        self.send(to, "Reset your password", &html).await
    }

    pub async fn send_payment_failed(&self, to: &str, plan_name: &str) -> Result<EmailSendResult> {
        let html = format!(
            "<p>The latest payment for your <strong>{}</strong> subscription failed.</p>\
             <p>Please update your payment method to keep your subscription active.</p>",
            plan_name
        );
        self.send(to, "Payment failed", &html).await
    }
}
