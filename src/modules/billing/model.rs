use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ============ Local billing reflection ============

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub stripe_payment_method_id: String,
    pub brand: String,
    pub last4: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentPlan {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub stripe_invoice_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Installment {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub sequence: i32,
    pub amount_cents: i64,
    pub currency: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub stripe_invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub installment_id: Option<Uuid>,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentVoucher {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub voucher_number: String,
    pub issued_at: DateTime<Utc>,
}

/// Installment lifecycle. Transitions move strictly forward: an installment
/// never returns to `pending`, and `paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
    Failed,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
            InstallmentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(InstallmentStatus::Pending),
            "paid" => Some(InstallmentStatus::Paid),
            "overdue" => Some(InstallmentStatus::Overdue),
            "failed" => Some(InstallmentStatus::Failed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: InstallmentStatus) -> bool {
        use InstallmentStatus::*;
        match (self, next) {
            (Pending, Paid) | (Pending, Overdue) | (Pending, Failed) => true,
            (Overdue, Paid) | (Overdue, Failed) => true,
            // a failed charge can still be collected by a later retry
            (Failed, Paid) => true,
            _ => false,
        }
    }
}

// ============ Gateway-facing DTOs ============

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductCreate {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in minor currency units.
    #[validate(range(min = 1))]
    pub unit_amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_interval() -> String {
    "month".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_id: String,
    pub unit_amount: i64,
    pub interval: String,
    pub currency: String,
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscriptionCreate {
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(length(min = 1))]
    pub price_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: String,
    pub status: String,
    pub customer_id: String,
    pub customer_email: String,
    pub product_name: String,
    pub unit_amount: i64,
    pub currency: String,
    pub interval: String,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionSearchParams {
    pub status: String,
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub url: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub status: String,
    pub event_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookConfigResponse {
    pub webhook_configured: bool,
    pub publishable_key: String,
}

#[cfg(test)]
mod tests {
    use super::InstallmentStatus::*;

    #[test]
    fn pending_moves_forward_only() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Overdue));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn paid_is_terminal() {
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Overdue));
        assert!(!Paid.can_transition_to(Failed));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn no_transition_back_to_pending() {
        assert!(!Overdue.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn late_collection_still_settles() {
        assert!(Overdue.can_transition_to(Paid));
        assert!(Failed.can_transition_to(Paid));
    }

    #[test]
    fn round_trips_through_storage_form() {
        for status in [Pending, Paid, Overdue, Failed] {
            assert_eq!(super::InstallmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(super::InstallmentStatus::parse("unknown"), None);
    }
}
