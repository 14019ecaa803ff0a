use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::store::Store;

/// Shared application state registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            tokens: TokenService::from_config(&config),
            config: Arc::new(config),
        }
    }

    /// Local settings around `store`: a fixed secret and the cheapest bcrypt
    /// cost.
    pub fn local(store: Arc<dyn Store>) -> Self {
        let config = Config {
            database_url: String::new(),
            server_host: "127.0.0.1".into(),
            server_port: 0,
            secret_key: "test-secret".into(),
            access_token_ttl: chrono::Duration::minutes(30),
            allowed_origins: Vec::new(),
            bcrypt_cost: 4,
        };
        Self::new(store, config)
    }
}
