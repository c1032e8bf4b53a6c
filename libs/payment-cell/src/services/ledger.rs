use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{
    CreatePaymentIntentRequest, Currency, PaymentError, PaymentIntentResponse, PaymentProcessor,
    PaymentRecord, PaymentStatus, WebhookEvent, DEFAULT_CURRENCY,
};
use crate::services::signature::verify_signature;
use crate::services::stripe::StripeClient;

pub struct PaymentService {
    supabase: SupabaseClient,
    stripe: StripeClient,
    webhook_secret: String,
}

#[derive(Debug)]
struct ValidatedIntent {
    appointment_id: Uuid,
    amount: i64,
    currency: Currency,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            stripe: StripeClient::new(config),
            webhook_secret: config.stripe_webhook_secret.clone(),
        }
    }

    fn validate(request: &CreatePaymentIntentRequest) -> Result<ValidatedIntent, PaymentError> {
        let amount = request.amount.ok_or(PaymentError::AmountRequired)?;
        let currency: Currency = request
            .currency
            .as_deref()
            .unwrap_or(DEFAULT_CURRENCY)
            .parse()?;

        if amount < currency.minimum_amount() {
            return Err(PaymentError::AmountTooLow {
                minimum: currency.minimum_amount(),
                currency: currency.code().to_string(),
            });
        }

        let appointment_id = request
            .appointment_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or(PaymentError::InvalidAppointment)?;

        Ok(ValidatedIntent { appointment_id, amount, currency })
    }

    /// Creates a processor intent for one of the caller's appointments and
    /// records it as a Pending payment attached to that appointment.
    pub async fn create_intent(
        &self,
        ctx: &AuthContext,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentResponse, PaymentError> {
        let intent = Self::validate(&request)?;

        let owned_path = format!(
            "/rest/v1/appointments?id=eq.{}&user_id=eq.{}&select=id",
            intent.appointment_id, ctx.user_id
        );
        let owned: Vec<Value> = self.supabase.select(&owned_path).await?;
        if owned.is_empty() {
            return Err(PaymentError::AppointmentNotFound);
        }

        if !self.stripe.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let processor_intent = self
            .stripe
            .create_payment_intent(intent.amount, intent.currency, ctx.user_id, intent.appointment_id, &ctx.email)
            .await
            .map_err(|e| PaymentError::Processor(e.to_string()))?;
        debug!(
            "Processor intent {} created with status {:?}",
            processor_intent.id, processor_intent.status
        );

        let record: PaymentRecord = self
            .supabase
            .insert(
                "payments",
                json!({
                    "user_id": ctx.user_id,
                    "appointment_id": intent.appointment_id,
                    "amount": intent.amount,
                    "currency": intent.currency.code(),
                    "processor": PaymentProcessor::Stripe,
                    "processor_reference": processor_intent.id,
                    "status": PaymentStatus::Pending,
                }),
            )
            .await?;

        let attach_path = format!("/rest/v1/appointments?id=eq.{}", intent.appointment_id);
        let _: Vec<Value> = self
            .supabase
            .update(&attach_path, json!({ "payment_id": record.id }))
            .await?;

        info!("Payment {} pending for appointment {}", record.id, intent.appointment_id);

        Ok(PaymentIntentResponse {
            client_secret: processor_intent.client_secret,
            payment_id: record.id,
            payment_intent_id: processor_intent.id,
        })
    }

    /// Applies a signed processor event. Untracked event types are
    /// acknowledged without changes; tracked ones only move Pending rows.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<(), PaymentError> {
        verify_signature(payload, signature, &self.webhook_secret, now)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::MalformedEvent(e.to_string()))?;

        let Some(outcome) = event.payment_outcome() else {
            debug!("Ignoring webhook event {} of type {}", event.id, event.event_type);
            return Ok(());
        };
        let intent_id = event
            .intent_id()
            .ok_or_else(|| PaymentError::MalformedEvent("event object has no id".to_string()))?;

        let path = format!(
            "/rest/v1/payments?processor_reference=eq.{}&status=eq.{}",
            intent_id,
            PaymentStatus::Pending
        );
        let updated: Vec<PaymentRecord> = self
            .supabase
            .update(&path, json!({ "status": outcome }))
            .await?;

        if updated.is_empty() {
            warn!("No pending payment for intent {} ({})", intent_id, event.event_type);
        } else {
            info!("Payment for intent {} marked {}", intent_id, outcome);
        }
        Ok(())
    }

    pub async fn history(&self, ctx: &AuthContext) -> Result<Vec<PaymentRecord>, PaymentError> {
        let path = format!(
            "/rest/v1/payments?user_id=eq.{}&order=created_at.desc",
            ctx.user_id
        );
        Ok(self.supabase.select(&path).await?)
    }
}
