use std::sync::Arc;

use storekeep_core::{LimiterRegistry, ProductStore, SharedClock, TokenSigner, UserStore};

use crate::config::ServerConfig;
use crate::middleware::metrics::HttpMetrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Per-client buckets consulted by the rate-limit gate on every request.
    pub limiter: Arc<LimiterRegistry>,
    pub tokens: Arc<TokenSigner>,
    pub users: Arc<UserStore>,
    pub products: Arc<ProductStore>,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    /// Builds the shared state from a validated config. Every component
    /// that needs time reads it from `clock`.
    pub fn new(config: ServerConfig, clock: SharedClock) -> Self {
        let limiter = LimiterRegistry::new(config.rate_limit.limiter_config(), clock.clone());
        let tokens = TokenSigner::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_ttl(),
            clock,
        );

        Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            tokens: Arc::new(tokens),
            users: Arc::new(UserStore::new()),
            products: Arc::new(ProductStore::new()),
            metrics: Arc::new(HttpMetrics::new()),
        }
    }
}
