use std::env;

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    pub webhook_secret: String,
    /// Base URL checkout redirects back to (success/cancel pages).
    pub frontend_url: String,
}

impl StripeConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            publishable_key: env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }

    pub fn webhook_configured(&self) -> bool {
        !self.webhook_secret.is_empty()
    }
}
