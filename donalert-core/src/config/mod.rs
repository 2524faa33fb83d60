//! Runtime configuration types.
//!
//! These are the validated values the processors work with. Parsing the
//! TOML file and applying CLI overrides is the server crate's job.

mod alerts;
mod config_store;
mod gateway;
mod server;

pub use alerts::{AlertsConfig, DonationsConfig};
pub use config_store::ConfigStore;
pub use gateway::GatewayConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    /// Listen address. Only read at startup.
    pub server: Arc<RwLock<ServerConfig>>,
    /// Payment gateway credentials and endpoints, read on every gateway call.
    pub gateway: ConfigStore<GatewayConfig>,
    /// Alert socket sizing.
    pub alerts: Arc<RwLock<AlertsConfig>>,
    /// Donation form rules.
    pub donations: Arc<RwLock<DonationsConfig>>,
}
