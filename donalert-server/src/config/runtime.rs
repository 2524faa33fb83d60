//! Runtime configuration re-exports.
//!
//! The validated config types live in `donalert-core::config`.

pub use donalert_core::config::{
    AlertsConfig, ConfigStore, DonationsConfig, GatewayConfig, ServerConfig, SharedConfig,
};
