//! Application lifespan: opens the database before serving and closes it afterwards.

use crate::config::{DatabaseConfig, ServerConfig};
use crate::database::Database;
use crate::error::{LifespanError, LifespanResult, Result};
use crate::lifespan::Lifespan;
use crate::server::state::{ServerState, ServerStateBuilder};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

/// Resources shared by every handler of a server run.
#[derive(Debug)]
pub struct AppContext {
    pub db: Database,
}

/// Connects the database on startup and disconnects it on shutdown.
pub struct AppLifespan {
    config: DatabaseConfig,
}

impl AppLifespan {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Lifespan for AppLifespan {
    type Context = AppContext;

    #[instrument(skip(self), fields(database = %self.config.name))]
    async fn startup(&self) -> LifespanResult<AppContext> {
        let db = Database::connect(self.config.clone())
            .await
            .map_err(LifespanError::from)?;
        info!("Lifespan context ready");
        Ok(AppContext { db })
    }

    #[instrument(skip(self, context), fields(database = %self.config.name))]
    async fn shutdown(&self, context: &AppContext) -> LifespanResult<()> {
        match serde_json::to_string(&context.db.metrics()) {
            Ok(metrics) => info!(metrics = %metrics, "Closing lifespan context"),
            Err(e) => warn!("Failed to serialize connection metrics: {}", e),
        }
        context.db.disconnect().await.map_err(LifespanError::from)
    }
}

/// Server state with the application tools, resources and prompts registered.
pub fn app_state(config: ServerConfig) -> Result<ServerState<AppContext>> {
    ServerStateBuilder::new()
        .config(config)
        .tools(crate::tools::create_registry())
        .resources(crate::resources::create_registry()?)
        .prompts(crate::prompts::create_registry())
        .build()
}
