//! Web control panel for batch migrations.
//!
//! Serves the page the crew pastes protocol lists into, plus the two
//! endpoints it talks to: start a batch, poll its status. All item
//! state lives in the shared registry; finished browser windows are
//! parked by the runner so they stay open for manual review.

mod assets;
mod handlers;
mod routes;
mod templates;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{GuiConfig, Settings};
use crate::services::{ParkedMigrators, StatusRegistry};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub registry: StatusRegistry,
    pub settings: Settings,
    pub config: Arc<RwLock<GuiConfig>>,
    pub config_path: PathBuf,
    pub parked: ParkedMigrators,
}

impl AppState {
    pub fn new(settings: Settings, config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(GuiConfig::default_path);
        let config = GuiConfig::load(&config_path);
        Self {
            registry: StatusRegistry::new(),
            settings,
            config: Arc::new(RwLock::new(config)),
            config_path,
            parked: ParkedMigrators::default(),
        }
    }
}

/// Start the web server.
pub async fn serve(
    settings: Settings,
    host: &str,
    port: u16,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let state = AppState::new(settings, config_path);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
