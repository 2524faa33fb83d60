//! TOML file configuration structures.
//!
//! These structs directly map to the `donalert-config.toml` file format.

use serde::Deserialize;
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub donations: DonationsConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Payment gateway section.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Midtrans server key.
    pub server_key: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_snap_base_url")]
    pub snap_base_url: String,
    /// Upper bound on one status re-verification call, in seconds.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
    /// Check `signature_key` on incoming notifications before verifying.
    #[serde(default = "default_true")]
    pub verify_signature: bool,
}

fn default_api_base_url() -> String {
    "https://api.sandbox.midtrans.com".to_string()
}

fn default_snap_base_url() -> String {
    "https://app.sandbox.midtrans.com/snap".to_string()
}

fn default_verify_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Alert socket section.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_capacity")]
    pub outbox_capacity: usize,
    #[serde(default = "default_capacity")]
    pub hub_queue_capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_capacity(),
            hub_queue_capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

/// Donation form section.
#[derive(Debug, Clone, Deserialize)]
pub struct DonationsConfig {
    /// Donations must be strictly greater than this.
    #[serde(default = "default_minimum_amount_cents")]
    pub minimum_amount_cents: i64,
}

impl Default for DonationsConfig {
    fn default() -> Self {
        Self {
            minimum_amount_cents: default_minimum_amount_cents(),
        }
    }
}

fn default_minimum_amount_cents() -> i64 {
    1000
}
