//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use donalert_core::framework::DatabaseProcessor;
use donalert_core::gateway::MidtransGateway;
use donalert_core::processors::{AlertHubHandle, SettlementPipeline};
use sqlx::PgPool;
use std::sync::Arc;

pub type Settlement = SettlementPipeline<MidtransGateway, DatabaseProcessor>;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Entry point to the alert hub.
    pub hub: AlertHubHandle,
    /// Gateway client used for checkout creation.
    pub gateway: MidtransGateway,
    /// Verify → reconcile → broadcast for incoming notifications.
    pub settlement: Arc<Settlement>,
}

impl AppState {
    pub fn new(db: PgPool, config: SharedConfig, hub: AlertHubHandle) -> Self {
        let gateway = MidtransGateway::new(config.gateway.clone());
        let settlement = Arc::new(SettlementPipeline::new(
            gateway.clone(),
            DatabaseProcessor { pool: db.clone() },
            hub.clone(),
        ));
        Self {
            db,
            config,
            hub,
            gateway,
            settlement,
        }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor {
            pool: self.db.clone(),
        }
    }
}
