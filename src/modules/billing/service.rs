use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::stripe::StripeConfig;

use super::error::BillingError;
use super::gateway::StripeGateway;
use super::model::{
    CheckoutSessionResponse, ProductCreate, ProductResponse, SubscriptionCreate,
    SubscriptionResponse, SubscriptionSearchParams,
};

pub struct BillingService;

impl BillingService {
    /// Create a product and its recurring price in one step.
    #[instrument(skip(gateway, dto))]
    pub async fn create_product(
        gateway: &StripeGateway,
        dto: ProductCreate,
    ) -> Result<ProductResponse, BillingError> {
        let product = gateway.create_product(&dto.name, &dto.description).await?;
        let product_id = product
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BillingError::Processing("Product response without id".to_string()))?;

        let price = gateway
            .create_price(product_id, dto.unit_amount, &dto.currency, &dto.interval)
            .await?;
        let price_id = price
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BillingError::Processing("Price response without id".to_string()))?;

        Ok(ProductResponse {
            id: product_id.to_string(),
            name: dto.name,
            description: dto.description,
            price_id: price_id.to_string(),
            unit_amount: dto.unit_amount,
            interval: dto.interval,
            currency: dto.currency,
            active: true,
        })
    }

    /// Active products joined with their prices; products without a price
    /// are dropped.
    #[instrument(skip(gateway))]
    pub async fn list_products(
        gateway: &StripeGateway,
    ) -> Result<Vec<ProductResponse>, BillingError> {
        let products = gateway.list_products().await?;
        let prices = gateway.list_prices().await?;

        let empty = Vec::new();
        let price_list = prices
            .pointer("/data")
            .and_then(|v| v.as_array())
            .unwrap_or(&empty);

        let mut price_map: HashMap<&str, &Value> = HashMap::new();
        for price in price_list {
            if let Some(product_id) = price.get("product").and_then(|v| v.as_str()) {
                price_map.insert(product_id, price);
            }
        }

        let mut responses = Vec::new();
        for product in products
            .pointer("/data")
            .and_then(|v| v.as_array())
            .unwrap_or(&empty)
        {
            let Some(product_id) = product.get("id").and_then(|v| v.as_str()) else {
                continue;
            };
            let Some(price) = price_map.get(product_id) else {
                continue;
            };

            responses.push(ProductResponse {
                id: product_id.to_string(),
                name: product
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                description: product
                    .get("description")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                price_id: price
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                unit_amount: price.get("unit_amount").and_then(|v| v.as_i64()).unwrap_or(0),
                interval: price
                    .pointer("/recurring/interval")
                    .and_then(|v| v.as_str())
                    .unwrap_or("month")
                    .to_string(),
                currency: price
                    .get("currency")
                    .and_then(|v| v.as_str())
                    .unwrap_or("usd")
                    .to_string(),
                active: product.get("active").and_then(|v| v.as_bool()).unwrap_or(false),
            });
        }

        Ok(responses)
    }

    #[instrument(skip(gateway, dto))]
    pub async fn create_subscription(
        gateway: &StripeGateway,
        dto: SubscriptionCreate,
    ) -> Result<Value, BillingError> {
        gateway
            .create_subscription(&dto.customer_id, &dto.price_id)
            .await
    }

    /// Active subscriptions with customer and price details resolved. A
    /// malformed entry is logged and skipped; it never fails the whole list.
    #[instrument(skip(gateway))]
    pub async fn list_subscriptions(
        gateway: &StripeGateway,
    ) -> Result<Vec<SubscriptionResponse>, BillingError> {
        let subscriptions = gateway.list_subscriptions().await?;

        let empty = Vec::new();
        let mut responses = Vec::new();

        for sub in subscriptions
            .pointer("/data")
            .and_then(|v| v.as_array())
            .unwrap_or(&empty)
        {
            let subscription_id = sub.get("id").and_then(|v| v.as_str()).unwrap_or("");
            let Some(item) = sub.pointer("/items/data/0") else {
                continue;
            };
            let price = item.get("price");

            let product_name = match price
                .and_then(|p| p.get("product"))
                .and_then(|v| v.as_str())
            {
                Some(product_id) => match gateway.retrieve_product(product_id).await {
                    Ok(product) => product
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("N/A")
                        .to_string(),
                    Err(e) => {
                        error!(
                            subscription_id = %subscription_id,
                            error = %e,
                            "Error resolving subscription product"
                        );
                        "N/A".to_string()
                    }
                },
                None => "N/A".to_string(),
            };

            responses.push(SubscriptionResponse {
                id: subscription_id.to_string(),
                status: sub
                    .get("status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                customer_id: sub
                    .pointer("/customer/id")
                    .and_then(|v| v.as_str())
                    .unwrap_or("N/A")
                    .to_string(),
                customer_email: sub
                    .pointer("/customer/email")
                    .and_then(|v| v.as_str())
                    .unwrap_or("N/A")
                    .to_string(),
                product_name,
                unit_amount: price
                    .and_then(|p| p.get("unit_amount"))
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0),
                currency: price
                    .and_then(|p| p.get("currency"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("usd")
                    .to_string(),
                interval: price
                    .and_then(|p| p.pointer("/recurring/interval"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("month")
                    .to_string(),
                current_period_end: sub.get("current_period_end").and_then(|v| v.as_i64()),
                cancel_at_period_end: sub
                    .get("cancel_at_period_end")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            });
        }

        info!(count = responses.len(), "Subscriptions retrieved successfully");

        Ok(responses)
    }

    #[instrument(skip(gateway))]
    pub async fn cancel_subscription(
        gateway: &StripeGateway,
        subscription_id: &str,
    ) -> Result<Value, BillingError> {
        gateway.cancel_subscription(subscription_id).await
    }

    #[instrument(skip(gateway))]
    pub async fn resume_subscription(
        gateway: &StripeGateway,
        subscription_id: &str,
    ) -> Result<Value, BillingError> {
        gateway.resume_subscription(subscription_id).await
    }

    #[instrument(skip(gateway, params))]
    pub async fn search_subscriptions(
        gateway: &StripeGateway,
        params: SubscriptionSearchParams,
    ) -> Result<Value, BillingError> {
        let mut query = format!("status:'{}'", params.status);
        if let Some(order_id) = &params.order_id {
            query.push_str(&format!(" AND metadata['order_id']:'{}'", order_id));
        }

        gateway.search_subscriptions(&query).await
    }

    /// Subscription checkout for an existing price; redirect targets come
    /// from the configured frontend base URL.
    #[instrument(skip(gateway, config))]
    pub async fn create_checkout_session(
        gateway: &StripeGateway,
        config: &StripeConfig,
        price_id: &str,
    ) -> Result<CheckoutSessionResponse, BillingError> {
        let success_url = format!(
            "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            config.frontend_url
        );
        let cancel_url = format!("{}/checkout/cancel", config.frontend_url);

        let session = gateway
            .create_checkout_session(price_id, &success_url, &cancel_url)
            .await?;

        let session_id = session
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BillingError::Processing("Session response without id".to_string()))?;
        let url = session
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                BillingError::Processing("Session response missing checkout URL".to_string())
            })?;

        Ok(CheckoutSessionResponse {
            url: url.to_string(),
            session_id: session_id.to_string(),
        })
    }
}
