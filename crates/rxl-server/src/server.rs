use tokio::net::TcpListener;

use rxl_ledger::Ledger;
use rxl_store::ChainStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// RXL ledger server.
pub struct RxlServer {
    config: ServerConfig,
    state: AppState,
}

impl RxlServer {
    /// Open the configured store and wrap the resulting ledger.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let ledger = Ledger::open(config.store.open())?;
        Ok(Self::with_ledger(config, ledger))
    }

    /// Serve an already opened ledger.
    pub fn with_ledger(config: ServerConfig, ledger: Ledger<Box<dyn ChainStore>>) -> Self {
        Self {
            config,
            state: AppState::new(ledger),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("RXL server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
