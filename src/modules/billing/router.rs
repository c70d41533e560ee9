use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::modules::billing::controller::{
    cancel_subscription, create_checkout_session, create_product, create_subscription,
    list_products, list_subscriptions, resume_subscription, search_subscriptions, stripe_webhook,
    webhook_config,
};
use crate::state::AppState;

pub fn init_billing_router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(stripe_webhook))
        .route("/webhook-config", get(webhook_config))
        .route("/products", post(create_product).get(list_products))
        .route(
            "/subscriptions",
            post(create_subscription).get(list_subscriptions),
        )
        .route("/subscriptions/search", get(search_subscriptions))
        .route("/subscriptions/{subscription_id}", delete(cancel_subscription))
        .route(
            "/resume-subscription/{subscription_id}",
            post(resume_subscription),
        )
        .route("/checkout-session/{price_id}", post(create_checkout_session))
}
