//! Thin HTTP client for the Stripe REST API.
//!
//! Requests are form-encoded with basic auth on the secret key; responses
//! come back as raw JSON values which the service layer reshapes. Gateway
//! error bodies are reduced to their `error.message`.

use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::config::stripe::StripeConfig;

use super::error::BillingError;

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone, Debug)]
pub struct StripeGateway {
    http: Client,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: Client::new(),
            secret_key: config.secret_key.clone(),
        }
    }

    fn ensure_configured(&self) -> Result<(), BillingError> {
        if self.secret_key.is_empty() {
            return Err(BillingError::Config);
        }
        Ok(())
    }

    async fn handle_response(response: reqwest::Response) -> Result<Value, BillingError> {
        let status = response.status();
        let body_text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body_text)?);
        }

        let message = match serde_json::from_str::<Value>(&body_text) {
            Ok(json_body) => json_body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or(&body_text)
                .to_string(),
            Err(_) => body_text,
        };

        Err(BillingError::Api {
            status_code: status.as_u16(),
            message,
        })
    }

    async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<Value, BillingError> {
        self.ensure_configured()?;
        let response = self
            .http
            .post(format!("{API_BASE}{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, BillingError> {
        self.ensure_configured()?;
        let response = self
            .http
            .get(format!("{API_BASE}{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(query)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<Value, BillingError> {
        self.ensure_configured()?;
        let response = self
            .http
            .delete(format!("{API_BASE}{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, name: &str, description: &str) -> Result<Value, BillingError> {
        let form = vec![
            ("name".to_string(), name.to_string()),
            ("description".to_string(), description.to_string()),
            ("active".to_string(), "true".to_string()),
        ];
        self.post_form("/products", &form).await
    }

    #[instrument(skip(self))]
    pub async fn create_price(
        &self,
        product_id: &str,
        unit_amount: i64,
        currency: &str,
        interval: &str,
    ) -> Result<Value, BillingError> {
        let form = vec![
            ("product".to_string(), product_id.to_string()),
            ("unit_amount".to_string(), unit_amount.to_string()),
            ("currency".to_string(), currency.to_string()),
            ("recurring[interval]".to_string(), interval.to_string()),
        ];
        self.post_form("/prices", &form).await
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Value, BillingError> {
        self.get("/products", &[("active", "true")]).await
    }

    #[instrument(skip(self))]
    pub async fn list_prices(&self) -> Result<Value, BillingError> {
        self.get("/prices", &[("active", "true")]).await
    }

    #[instrument(skip(self))]
    pub async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<Value, BillingError> {
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("items[0][price]".to_string(), price_id.to_string()),
            ("payment_behavior".to_string(), "default_incomplete".to_string()),
            ("expand[]".to_string(), "latest_invoice.payment_intent".to_string()),
        ];
        self.post_form("/subscriptions", &form).await
    }

    #[instrument(skip(self))]
    pub async fn list_subscriptions(&self) -> Result<Value, BillingError> {
        self.get(
            "/subscriptions",
            &[
                ("status", "active"),
                ("expand[]", "data.customer"),
                ("expand[]", "data.items.data.price"),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_product(&self, product_id: &str) -> Result<Value, BillingError> {
        self.get(&format!("/products/{product_id}"), &[]).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<Value, BillingError> {
        self.delete(&format!("/subscriptions/{subscription_id}")).await
    }

    #[instrument(skip(self))]
    pub async fn resume_subscription(&self, subscription_id: &str) -> Result<Value, BillingError> {
        let form = vec![("billing_cycle_anchor".to_string(), "now".to_string())];
        self.post_form(&format!("/subscriptions/{subscription_id}/resume"), &form)
            .await
    }

    #[instrument(skip(self))]
    pub async fn search_subscriptions(&self, query: &str) -> Result<Value, BillingError> {
        self.get("/subscriptions/search", &[("query", query)]).await
    }

    #[instrument(skip(self))]
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<Value, BillingError> {
        let form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
        ];
        self.post_form("/checkout/sessions", &form).await
    }
}
