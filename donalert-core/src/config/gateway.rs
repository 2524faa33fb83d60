//! Payment gateway configuration.

use std::time::Duration;
use url::Url;

/// Credentials and endpoints for the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Server key, used for HTTP basic auth and notification signatures.
    pub server_key: String,
    /// Core API base, e.g. `https://api.sandbox.midtrans.com`.
    pub api_base_url: Url,
    /// Checkout API base, e.g. `https://app.sandbox.midtrans.com/snap`.
    pub snap_base_url: Url,
    /// Upper bound on one status re-verification call.
    pub verify_timeout: Duration,
    /// Reject notifications whose `signature_key` does not match.
    pub verify_signature: bool,
}
