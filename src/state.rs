use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::config::stripe::StripeConfig;
use crate::modules::billing::gateway::StripeGateway;
use crate::modules::billing::webhook::{WebhookQueue, spawn_webhook_worker};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub stripe_config: StripeConfig,
    pub cors_config: CorsConfig,
    pub gateway: StripeGateway,
    pub webhook_queue: WebhookQueue,
}

impl AppState {
    /// Wires the webhook consumer task to the same pool the request path
    /// uses. Must be called from within a Tokio runtime.
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        stripe_config: StripeConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let gateway = StripeGateway::new(&stripe_config);
        let webhook_queue = spawn_webhook_worker(db.clone());

        Self {
            db,
            jwt_config,
            stripe_config,
            cors_config,
            gateway,
            webhook_queue,
        }
    }
}

pub async fn init_app_state() -> AppState {
    AppState::new(
        init_db_pool().await,
        JwtConfig::from_env(),
        StripeConfig::from_env(),
        CorsConfig::from_env(),
    )
}
