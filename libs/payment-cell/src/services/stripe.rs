use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{Currency, PaymentIntent};

/// Minimal Stripe payment-intents client.
pub struct StripeClient {
    http_client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http_client: Client::new(),
            secret_key: config.stripe_secret_key.clone(),
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: Currency,
        user_id: Uuid,
        appointment_id: Uuid,
        receipt_email: &str,
    ) -> Result<PaymentIntent> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        debug!("Creating payment intent of {} {} for user {}", amount, currency.code(), user_id);

        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.code().to_string()),
            ("receipt_email", receipt_email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[appointment_id]", appointment_id.to_string()),
        ];

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Stripe API error ({}): {}", status, error_text));
        }

        Ok(response.json::<PaymentIntent>().await?)
    }
}
