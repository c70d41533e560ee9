use axum::http::StatusCode;
use thiserror::Error;

use crate::utils::errors::AppError;

/// Billing-specific error types.
#[derive(Error, Debug)]
pub enum BillingError {
    /// Error occurred during a payment gateway request
    #[error("Payment gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Error returned by the payment gateway
    #[error("{message}")]
    Api { status_code: u16, message: String },

    /// Error parsing a payment gateway response
    #[error("Failed to parse payment gateway response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing or incomplete gateway configuration
    #[error("Payment gateway configuration missing or incomplete")]
    Config,

    /// Webhook signature verification failed
    #[error("Invalid webhook signature: {0}")]
    Signature(String),

    /// Webhook event processing error
    #[error("Webhook event processing error: {0}")]
    Processing(String),

    /// Billing store failure while reconciling local state
    #[error("Billing store error: {0}")]
    Database(#[from] sqlx::Error),

    /// Terminal payment failure, including exhausted retries
    #[error("{0}")]
    Payment(String),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Request(_) => StatusCode::BAD_GATEWAY,
            BillingError::Api { status_code, .. } => {
                StatusCode::from_u16(*status_code).unwrap_or(StatusCode::BAD_REQUEST)
            }
            BillingError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::Config => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::Signature(_) => StatusCode::BAD_REQUEST,
            BillingError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BillingError::Payment(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Boundary translation; a dedicated `From` impl would collide with the
    /// blanket anyhow conversion on `AppError`.
    pub fn into_app_error(self) -> AppError {
        AppError::new(self.status_code(), self)
    }
}
