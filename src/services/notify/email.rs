use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{BookingConfirmation, Notifier};

/// Delivers confirmations through an HTTP transactional-email API.
pub struct EmailNotifier {
    api_url: String,
    api_key: String,
    from: String,
    salon_name: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text_body: String,
}

impl EmailNotifier {
    pub fn new(api_url: String, api_key: String, from: String, salon_name: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            salon_name,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_confirmation(&self, confirmation: &BookingConfirmation) -> anyhow::Result<()> {
        let payload = EmailPayload {
            from: &self.from,
            to: &confirmation.recipient,
            subject: confirmation.subject(&self.salon_name),
            text_body: confirmation.body(&self.salon_name),
        };

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to reach email API")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}
