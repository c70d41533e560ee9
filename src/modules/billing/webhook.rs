//! Webhook intake and reconciliation.
//!
//! Verified events are acknowledged immediately and pushed onto an in-process
//! queue; a consumer task drains it and runs the dispatch table. One event's
//! failure never stops the consumer, and handlers are written as upserts so
//! gateway redelivery and out-of-order arrival stay harmless.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use sqlx::PgPool;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::BillingError;
use super::model::{Installment, InstallmentStatus};

const INSTALLMENT_COLUMNS: &str = "id, plan_id, sequence, amount_cents, currency, due_date, \
     status, stripe_invoice_id, created_at, updated_at";

const SIGNATURE_TOLERANCE_SECONDS: i64 = 600;

const MAX_RETRIES: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_secs(2);

// ============ Event shape ============

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

/// Per-event dispatch result; skipped events are acknowledged, not errors.
#[derive(Debug)]
pub enum EventOutcome {
    Success(String),
    Skipped(String),
}

// ============ Signature verification ============

/// Verifies the `Stripe-Signature` header against the raw payload.
///
/// The header carries a timestamp `t` and one or more `v1` HMAC-SHA256
/// signatures over `"{t}.{payload}"`; any matching `v1` passes. Events whose
/// timestamp drifts more than ten minutes from our clock are rejected.
pub fn verify_stripe_signature(
    payload: &[u8],
    sig_header: Option<&str>,
    secret: &str,
) -> Result<(), BillingError> {
    let sig_header_value = sig_header
        .ok_or_else(|| BillingError::Signature("Missing Stripe-Signature header".to_string()))?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();

    for item in sig_header_value.split(',') {
        let parts: Vec<&str> = item.trim().splitn(2, '=').collect();
        if parts.len() == 2 {
            match parts[0] {
                "t" => timestamp_str = Some(parts[1]),
                "v1" => v1_signatures_hex.push(parts[1]),
                _ => {}
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        BillingError::Signature("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        BillingError::Signature("Invalid timestamp format in Stripe-Signature".to_string())
    })?;

    if v1_signatures_hex.is_empty() {
        return Err(BillingError::Signature(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    let current_timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    if (current_timestamp - parsed_timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
        return Err(BillingError::Signature(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!("{}.{}", timestamp_str, String::from_utf8_lossy(payload));

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::Signature("Invalid webhook secret for HMAC".to_string()))?;
    mac.update(signed_payload.as_bytes());
    let calculated_signature_hex = hex::encode(mac.finalize().into_bytes());

    for provided_sig_hex in v1_signatures_hex {
        if constant_time_eq(
            calculated_signature_hex.as_bytes(),
            provided_sig_hex.as_bytes(),
        ) {
            return Ok(());
        }
    }

    Err(BillingError::Signature("Signature mismatch".to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// ============ Queue + consumer ============

#[derive(Clone, Debug)]
pub struct WebhookQueue {
    tx: UnboundedSender<StripeEvent>,
}

impl WebhookQueue {
    pub fn enqueue(&self, event: StripeEvent) -> Result<(), BillingError> {
        self.tx
            .send(event)
            .map_err(|_| BillingError::Processing("Webhook consumer is gone".to_string()))
    }
}

/// Spawns the consumer task and returns the handle used to feed it.
pub fn spawn_webhook_worker(db: PgPool) -> WebhookQueue {
    let (tx, mut rx) = mpsc::unbounded_channel::<StripeEvent>();

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let event_id = event.id.clone();
            let event_type = event.event_type.clone();

            match process_event(&db, &event).await {
                Ok(EventOutcome::Success(message)) => {
                    info!(
                        event_id = %event_id,
                        event_type = %event_type,
                        message = %message,
                        "Webhook processed successfully"
                    );
                }
                Ok(EventOutcome::Skipped(message)) => {
                    info!(
                        event_id = %event_id,
                        event_type = %event_type,
                        message = %message,
                        "Unhandled event type - skipping"
                    );
                }
                Err(e) => {
                    error!(
                        event_id = %event_id,
                        event_type = %event_type,
                        error = %e,
                        "Error processing webhook"
                    );
                }
            }
        }

        info!("Webhook consumer stopped");
    });

    WebhookQueue { tx }
}

// ============ Dispatch table ============

pub async fn process_event(db: &PgPool, event: &StripeEvent) -> Result<EventOutcome, BillingError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => handle_checkout_completed(db, event).await,
        "customer.subscription.created" | "customer.subscription.updated" => {
            handle_subscription_upsert(db, &event.data.object).await
        }
        "customer.subscription.deleted" => handle_subscription_deleted(db, &event.data.object).await,
        "invoice.paid" => handle_invoice_paid(db, &event.data.object).await,
        "invoice.payment_failed" => handle_payment_failed(db, &event.data.object).await,
        other => Ok(EventOutcome::Skipped(format!(
            "Event type {} is not handled",
            other
        ))),
    }
}

// ============ Retry policy ============

/// Exponential backoff: delays of `base`, `2*base`, ... between attempts; the
/// last failure is returned as-is with no trailing sleep.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, BillingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BillingError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 >= max_retries {
                    return Err(e);
                }
                let delay = base_delay * 2u32.pow(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    next_retry_in = ?delay,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// ============ Handlers ============

async fn handle_checkout_completed(
    db: &PgPool,
    event: &StripeEvent,
) -> Result<EventOutcome, BillingError> {
    let session = &event.data.object;

    let email = session
        .pointer("/customer_details/email")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            BillingError::Processing("Checkout session without customer email".to_string())
        })?;
    let stripe_customer = session.get("customer").and_then(|v| v.as_str());
    let subscription_id = session.get("subscription").and_then(|v| v.as_str());

    retry_with_backoff(MAX_RETRIES, BASE_RETRY_DELAY, || {
        process_successful_checkout(db, email, stripe_customer, subscription_id)
    })
    .await
    .map_err(|e| BillingError::Payment(format!("Failed to process checkout: {}", e)))?;

    Ok(EventOutcome::Success(format!(
        "Checkout completed for {}",
        email
    )))
}

async fn process_successful_checkout(
    db: &PgPool,
    email: &str,
    stripe_customer: Option<&str>,
    subscription_id: Option<&str>,
) -> Result<(), BillingError> {
    let customer_id: Uuid = sqlx::query_scalar(
        "INSERT INTO customers (email, stripe_customer_id, user_id)
         VALUES ($1, $2, (SELECT id FROM users WHERE email = $1))
         ON CONFLICT (email) DO UPDATE SET
             stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, customers.stripe_customer_id),
             updated_at = NOW()
         RETURNING id",
    )
    .bind(email)
    .bind(stripe_customer)
    .fetch_one(db)
    .await?;

    if let Some(subscription_id) = subscription_id {
        sqlx::query(
            "INSERT INTO payment_plans (customer_id, stripe_subscription_id, status)
             VALUES ($1, $2, 'active')
             ON CONFLICT (stripe_subscription_id) DO UPDATE SET
                 customer_id = COALESCE(payment_plans.customer_id, EXCLUDED.customer_id),
                 status = 'active',
                 updated_at = NOW()",
        )
        .bind(customer_id)
        .bind(subscription_id)
        .execute(db)
        .await?;
    }

    Ok(())
}

/// Upsert keyed on the gateway subscription id, so `updated` arriving before
/// `created` degrades to create-then-update.
async fn handle_subscription_upsert(
    db: &PgPool,
    object: &Value,
) -> Result<EventOutcome, BillingError> {
    let subscription_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::Processing("Subscription event without id".to_string()))?;
    let status = object
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("active");
    let price_id = object
        .pointer("/items/data/0/price/id")
        .and_then(|v| v.as_str());
    let customer_row_id = resolve_customer(db, object).await?;

    sqlx::query(
        "INSERT INTO payment_plans (customer_id, stripe_subscription_id, stripe_price_id, status)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (stripe_subscription_id) DO UPDATE SET
             customer_id = COALESCE(payment_plans.customer_id, EXCLUDED.customer_id),
             stripe_price_id = COALESCE(EXCLUDED.stripe_price_id, payment_plans.stripe_price_id),
             status = EXCLUDED.status,
             updated_at = NOW()",
    )
    .bind(customer_row_id)
    .bind(subscription_id)
    .bind(price_id)
    .bind(status)
    .execute(db)
    .await?;

    // Keep the customer's payment-method list current when the event names one
    if let (Some(customer_id), Some(payment_method)) = (
        customer_row_id,
        object.get("default_payment_method").and_then(|v| v.as_str()),
    ) {
        sqlx::query(
            "INSERT INTO payment_methods (customer_id, stripe_payment_method_id)
             VALUES ($1, $2)
             ON CONFLICT (stripe_payment_method_id) DO NOTHING",
        )
        .bind(customer_id)
        .bind(payment_method)
        .execute(db)
        .await?;
    }

    Ok(EventOutcome::Success(format!(
        "Subscription {} is {}",
        subscription_id, status
    )))
}

async fn handle_subscription_deleted(
    db: &PgPool,
    object: &Value,
) -> Result<EventOutcome, BillingError> {
    let subscription_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::Processing("Subscription event without id".to_string()))?;

    sqlx::query(
        "UPDATE payment_plans SET status = 'canceled', updated_at = NOW()
         WHERE stripe_subscription_id = $1",
    )
    .bind(subscription_id)
    .execute(db)
    .await?;

    Ok(EventOutcome::Success(format!(
        "Subscription cancelled: {}",
        subscription_id
    )))
}

async fn handle_invoice_paid(db: &PgPool, object: &Value) -> Result<EventOutcome, BillingError> {
    let stripe_invoice_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::Processing("Invoice event without id".to_string()))?;
    let subscription_id = object
        .get("subscription")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            BillingError::Processing("Invoice event without a subscription".to_string())
        })?;
    let amount_cents = object
        .get("amount_paid")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let currency = object
        .get("currency")
        .and_then(|v| v.as_str())
        .unwrap_or("usd");
    let customer_row_id = resolve_customer(db, object).await?;

    let plan_id: Uuid = sqlx::query_scalar(
        "INSERT INTO payment_plans (customer_id, stripe_subscription_id, status)
         VALUES ($1, $2, 'active')
         ON CONFLICT (stripe_subscription_id) DO UPDATE SET
             customer_id = COALESCE(payment_plans.customer_id, EXCLUDED.customer_id),
             updated_at = NOW()
         RETURNING id",
    )
    .bind(customer_row_id)
    .bind(subscription_id)
    .fetch_one(db)
    .await?;

    // Resolve (or create) the installment this invoice settles.
    let existing: Option<Installment> = sqlx::query_as(&format!(
        "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE stripe_invoice_id = $1"
    ))
    .bind(stripe_invoice_id)
    .fetch_optional(db)
    .await?;

    let installment_id = match existing {
        Some(installment) => {
            let current = InstallmentStatus::parse(&installment.status)
                .unwrap_or(InstallmentStatus::Pending);
            if current == InstallmentStatus::Paid {
                return Ok(EventOutcome::Success(format!(
                    "Invoice {} already recorded",
                    stripe_invoice_id
                )));
            }
            if !current.can_transition_to(InstallmentStatus::Paid) {
                warn!(
                    installment_id = %installment.id,
                    status = %installment.status,
                    "Ignoring regressive installment transition"
                );
                return Ok(EventOutcome::Success(format!(
                    "Invoice {} left untouched",
                    stripe_invoice_id
                )));
            }

            sqlx::query(
                "UPDATE installments SET status = 'paid', amount_cents = $1, updated_at = NOW()
                 WHERE id = $2",
            )
            .bind(amount_cents)
            .bind(installment.id)
            .execute(db)
            .await?;
            installment.id
        }
        None => {
            sqlx::query_scalar(
                "INSERT INTO installments (plan_id, sequence, amount_cents, currency, status, stripe_invoice_id)
                 VALUES ($1,
                         (SELECT COALESCE(MAX(sequence) + 1, 1) FROM installments WHERE plan_id = $1),
                         $2, $3, 'paid', $4)
                 RETURNING id",
            )
            .bind(plan_id)
            .bind(amount_cents)
            .bind(currency)
            .bind(stripe_invoice_id)
            .fetch_one(db)
            .await?
        }
    };

    sqlx::query(
        "INSERT INTO invoices (customer_id, plan_id, stripe_invoice_id, amount_cents, currency, status, paid_date)
         VALUES ($1, $2, $3, $4, $5, 'paid', NOW())
         ON CONFLICT (stripe_invoice_id) DO UPDATE SET
             status = 'paid',
             paid_date = NOW(),
             amount_cents = EXCLUDED.amount_cents,
             updated_at = NOW()",
    )
    .bind(customer_row_id)
    .bind(plan_id)
    .bind(stripe_invoice_id)
    .bind(amount_cents)
    .bind(currency)
    .execute(db)
    .await?;

    let payment_id: Uuid = sqlx::query_scalar(
        "INSERT INTO payments (installment_id, amount_cents, currency) VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(installment_id)
    .bind(amount_cents)
    .bind(currency)
    .fetch_one(db)
    .await?;

    sqlx::query("INSERT INTO payment_vouchers (payment_id, voucher_number) VALUES ($1, $2)")
        .bind(payment_id)
        .bind(format!("V-{}", payment_id.simple()))
        .execute(db)
        .await?;

    Ok(EventOutcome::Success(format!(
        "Invoice {} settled",
        stripe_invoice_id
    )))
}

async fn handle_payment_failed(db: &PgPool, object: &Value) -> Result<EventOutcome, BillingError> {
    let stripe_invoice_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BillingError::Processing("Invoice event without id".to_string()))?;
    let customer = object
        .get("customer")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let attempt_count = object
        .get("attempt_count")
        .and_then(|v| v.as_i64())
        .unwrap_or(1);

    let existing: Option<Installment> = sqlx::query_as(&format!(
        "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE stripe_invoice_id = $1"
    ))
    .bind(stripe_invoice_id)
    .fetch_optional(db)
    .await?;

    if let Some(installment) = existing {
        let current =
            InstallmentStatus::parse(&installment.status).unwrap_or(InstallmentStatus::Pending);
        if current.can_transition_to(InstallmentStatus::Failed) {
            sqlx::query("UPDATE installments SET status = 'failed', updated_at = NOW() WHERE id = $1")
                .bind(installment.id)
                .execute(db)
                .await?;
        } else {
            warn!(
                installment_id = %installment.id,
                status = %installment.status,
                "Ignoring regressive installment transition"
            );
        }
    }

    if let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) {
        sqlx::query(
            "UPDATE payment_plans SET status = 'past_due', updated_at = NOW()
             WHERE stripe_subscription_id = $1",
        )
        .bind(subscription_id)
        .execute(db)
        .await?;
    }

    sqlx::query(
        "UPDATE invoices SET status = 'payment_failed', updated_at = NOW()
         WHERE stripe_invoice_id = $1",
    )
    .bind(stripe_invoice_id)
    .execute(db)
    .await?;

    Ok(EventOutcome::Success(format!(
        "Payment failed for customer: {}, attempt: {}",
        customer, attempt_count
    )))
}

/// Map the event's gateway customer id onto a local customer row, if we have
/// seen it.
async fn resolve_customer(db: &PgPool, object: &Value) -> Result<Option<Uuid>, BillingError> {
    let Some(stripe_customer) = object.get("customer").and_then(|v| v.as_str()) else {
        return Ok(None);
    };

    let id = sqlx::query_scalar("SELECT id FROM customers WHERE stripe_customer_id = $1")
        .bind(stripe_customer)
        .fetch_optional(db)
        .await?;

    Ok(id)
}
