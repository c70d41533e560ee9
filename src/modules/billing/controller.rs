use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    CheckoutSessionResponse, ProductCreate, ProductResponse, SubscriptionCreate,
    SubscriptionResponse, SubscriptionSearchParams, WebhookConfigResponse, WebhookResponse,
};
use super::service::BillingService;
use super::webhook::{StripeEvent, verify_stripe_signature};

/// Payment gateway webhook intake.
///
/// The signature is verified against the raw body; a verified event is
/// queued for background processing and acknowledged immediately, so the
/// gateway's delivery retries never stack up behind our own handling.
#[utoipa::path(
    post,
    path = "/api/stripe/webhook",
    responses(
        (status = 200, description = "Event accepted for processing", body = WebhookResponse),
        (status = 400, description = "Missing or invalid signature")
    ),
    tag = "Stripe"
)]
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());

    verify_stripe_signature(
        body.as_bytes(),
        signature,
        &state.stripe_config.webhook_secret,
    )
    .map_err(|e| e.into_app_error())?;

    let event: StripeEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid webhook payload: {}", e)))?;

    let event_id = event.id.clone();
    info!(event_id = %event_id, event_type = %event.event_type, "Webhook verified");

    state
        .webhook_queue
        .enqueue(event)
        .map_err(|e| e.into_app_error())?;

    Ok(Json(WebhookResponse {
        status: "accepted".to_string(),
        message: format!("Webhook accepted: {}", event_id),
        event_id,
    }))
}

/// Diagnostic: is the webhook secret configured?
#[utoipa::path(
    get,
    path = "/api/stripe/webhook-config",
    responses((status = 200, description = "Webhook configuration state", body = WebhookConfigResponse)),
    tag = "Stripe"
)]
#[instrument(skip(state))]
pub async fn webhook_config(State(state): State<AppState>) -> Json<WebhookConfigResponse> {
    Json(WebhookConfigResponse {
        webhook_configured: state.stripe_config.webhook_configured(),
        publishable_key: state.stripe_config.publishable_key.clone(),
    })
}

/// Create a product with a recurring price
#[utoipa::path(
    post,
    path = "/api/stripe/products",
    request_body = ProductCreate,
    responses(
        (status = 200, description = "Created product", body = ProductResponse),
        (status = 400, description = "Gateway rejected the request")
    ),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_product(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(dto): Json<ProductCreate>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = BillingService::create_product(&state.gateway, dto)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(product))
}

/// List active products with their prices
#[utoipa::path(
    get,
    path = "/api/stripe/products",
    responses((status = 200, description = "Active products", body = Vec<ProductResponse>)),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_products(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = BillingService::list_products(&state.gateway)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(products))
}

/// Create a subscription for an existing customer and price
#[utoipa::path(
    post,
    path = "/api/stripe/subscriptions",
    request_body = SubscriptionCreate,
    responses((status = 200, description = "Gateway subscription object")),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user, dto))]
pub async fn create_subscription(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(dto): Json<SubscriptionCreate>,
) -> Result<Json<Value>, AppError> {
    let subscription = BillingService::create_subscription(&state.gateway, dto)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(subscription))
}

/// List active subscriptions
#[utoipa::path(
    get,
    path = "/api/stripe/subscriptions",
    responses((status = 200, description = "Active subscriptions", body = Vec<SubscriptionResponse>)),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let subscriptions = BillingService::list_subscriptions(&state.gateway)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(subscriptions))
}

/// Search subscriptions by status and optional order id
#[utoipa::path(
    get,
    path = "/api/stripe/subscriptions/search",
    responses((status = 200, description = "Gateway search result")),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user, params))]
pub async fn search_subscriptions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<SubscriptionSearchParams>,
) -> Result<Json<Value>, AppError> {
    let result = BillingService::search_subscriptions(&state.gateway, params)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(result))
}

/// Cancel a subscription
#[utoipa::path(
    delete,
    path = "/api/stripe/subscriptions/{subscription_id}",
    responses((status = 200, description = "Cancelled subscription object")),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(subscription_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let subscription = BillingService::cancel_subscription(&state.gateway, &subscription_id)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(subscription))
}

/// Resume a cancelled subscription
#[utoipa::path(
    post,
    path = "/api/stripe/resume-subscription/{subscription_id}",
    responses((status = 200, description = "Resumed subscription object")),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user))]
pub async fn resume_subscription(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(subscription_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let subscription = BillingService::resume_subscription(&state.gateway, &subscription_id)
        .await
        .map_err(|e| e.into_app_error())?;
    Ok(Json(subscription))
}

/// Start a subscription checkout for a price
#[utoipa::path(
    post,
    path = "/api/stripe/checkout-session/{price_id}",
    responses(
        (status = 200, description = "Hosted checkout session", body = CheckoutSessionResponse),
        (status = 400, description = "Gateway rejected the request")
    ),
    security(("bearer_auth" = [])),
    tag = "Stripe"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(price_id): Path<String>,
) -> Result<Json<CheckoutSessionResponse>, AppError> {
    let session =
        BillingService::create_checkout_session(&state.gateway, &state.stripe_config, &price_id)
            .await
            .map_err(|e| e.into_app_error())?;
    Ok(Json(session))
}
