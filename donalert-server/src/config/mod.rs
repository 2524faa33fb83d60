//! Configuration module for donalert-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AlertsConfig, ConfigStore, DonationsConfig, GatewayConfig, ServerConfig, SharedConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub alerts: AlertsConfig,
    pub donations: DonationsConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with a lock (or store) per section.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            gateway: ConfigStore::new(self.gateway),
            alerts: Arc::new(RwLock::new(self.alerts)),
            donations: Arc::new(RwLock::new(self.donations)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate and convert into runtime types
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.build_loaded_config(file_config)
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let gateway = file_config.gateway;
        if gateway.server_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.server_key must not be empty".to_string(),
            ));
        }
        if gateway.verify_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.verify_timeout_secs must be at least 1".to_string(),
            ));
        }
        let alerts = file_config.alerts;
        if alerts.outbox_capacity == 0 || alerts.hub_queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "alerts capacities must be at least 1".to_string(),
            ));
        }
        if file_config.donations.minimum_amount_cents < 0 {
            return Err(ConfigError::ValidationError(
                "donations.minimum_amount_cents must not be negative".to_string(),
            ));
        }

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            gateway: GatewayConfig {
                server_key: gateway.server_key,
                api_base_url: parse_url("gateway.api_base_url", &gateway.api_base_url)?,
                snap_base_url: parse_url("gateway.snap_base_url", &gateway.snap_base_url)?,
                verify_timeout: Duration::from_secs(gateway.verify_timeout_secs),
                verify_signature: gateway.verify_signature,
            },
            alerts: AlertsConfig {
                outbox_capacity: alerts.outbox_capacity,
                hub_queue_capacity: alerts.hub_queue_capacity,
            },
            donations: DonationsConfig {
                minimum_amount_cents: file_config.donations.minimum_amount_cents,
            },
        })
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::ValidationError(format!("{field}: {e}")))
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(listen: Option<SocketAddr>) -> ConfigLoader {
        ConfigLoader::new("./donalert-config.toml", listen)
    }

    #[test]
    fn test_build_runtime_config() {
        let loaded = loader(None)
            .load_str(
                r#"
[gateway]
server_key = "SB-Mid-server-abc"
verify_timeout_secs = 4
"#,
            )
            .unwrap();
        assert_eq!(loaded.gateway.verify_timeout, Duration::from_secs(4));
        assert_eq!(
            loaded.gateway.api_base_url.as_str(),
            "https://api.sandbox.midtrans.com/"
        );
        assert!(loaded.donations.accepts(1001));
        assert!(!loaded.donations.accepts(1000));
        assert_eq!(loaded.alerts.outbox_capacity, 256);
    }

    #[test]
    fn test_listen_override() {
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loaded = loader(Some(addr))
            .load_str("[gateway]\nserver_key = \"k\"\n")
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            "[gateway]\nserver_key = \"\"\n",
            "[gateway]\nserver_key = \"k\"\nverify_timeout_secs = 0\n",
            "[gateway]\nserver_key = \"k\"\napi_base_url = \"not a url\"\n",
            "[gateway]\nserver_key = \"k\"\n[alerts]\noutbox_capacity = 0\n",
            "[gateway]\nserver_key = \"k\"\n[donations]\nminimum_amount_cents = -1\n",
        ];
        for case in cases {
            assert!(
                matches!(loader(None).load_str(case), Err(ConfigError::ValidationError(_))),
                "accepted {case:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_shared_config_sections() {
        let shared = loader(None)
            .load_str("[gateway]\nserver_key = \"k\"\n")
            .unwrap()
            .into_shared();
        assert_eq!(shared.gateway.read().await.server_key, "k");
        assert_eq!(shared.donations.read().await.minimum_amount_cents, 1000);
    }
}
