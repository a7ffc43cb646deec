use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::{repo::UserStore, token::TokenIssuer, AuthService};
use crate::{config::AppConfig, db};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// Root token; each request works under a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub async fn init(config: &AppConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let store = db::connect(&config.database).await?;
        Ok(Self::with_store(store, config, shutdown))
    }

    pub fn with_store(
        store: Arc<dyn UserStore>,
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let auth = AuthService::new(
            store,
            TokenIssuer::from_minutes(config.auth.token_ttl_minutes),
            Duration::from_secs(config.auth.store_timeout_secs),
        );
        Self {
            auth: Arc::new(auth),
            shutdown,
        }
    }
}
