//! Midtrans implementation of [`PaymentGateway`].
//!
//! - Status: `GET {api_base_url}/v2/{order_id}/status`
//! - Checkout: `POST {snap_base_url}/v1/transactions`
//!
//! Both authenticate with HTTP basic auth, server key as the user name and
//! an empty password.

use super::{CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, VerifiedTransaction};
use crate::config::{ConfigStore, GatewayConfig};
use async_trait::async_trait;
use donalert_sdk::objects::TransactionStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use url::Url;

#[derive(Clone)]
pub struct MidtransGateway {
    http_client: reqwest::Client,
    config: ConfigStore<GatewayConfig>,
}

impl MidtransGateway {
    /// Create a new client. Credentials are re-read from `config` on every
    /// call, so a reload takes effect without rebuilding the client.
    pub fn new(config: ConfigStore<GatewayConfig>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_code: String,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    transaction_id: String,
    #[serde(default)]
    transaction_status: TransactionStatus,
    #[serde(default)]
    gross_amount: String,
}

impl StatusResponse {
    fn into_verified(self) -> Result<VerifiedTransaction, GatewayError> {
        // 404 "Transaction doesn't exist" and 5xx both come back without an id.
        if self.transaction_id.is_empty() {
            return Err(GatewayError::Api {
                status_code: self.status_code,
                message: self.status_message,
            });
        }
        let gross_amount = Decimal::from_str(&self.gross_amount)
            .map_err(|_| GatewayError::InvalidAmount(self.gross_amount.clone()))?;
        Ok(VerifiedTransaction {
            order_id: self.order_id,
            transaction_id: self.transaction_id,
            status: self.transaction_status,
            gross_amount,
        })
    }
}

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    redirect_url: String,
    #[serde(default)]
    error_messages: Vec<String>,
}

/// Append `segments` to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GatewayError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn check_transaction(&self, order_id: &str) -> Result<VerifiedTransaction, GatewayError> {
        let (url, server_key) = {
            let config = self.config.read().await;
            let url = endpoint(&config.api_base_url, &["v2", order_id, "status"])?;
            (url, config.server_key.clone())
        };

        let response = self
            .http_client
            .get(url)
            .basic_auth(server_key, Some(""))
            .header("Accept", "application/json")
            .send()
            .await?;
        let http_status = response.status();
        let body = response.text().await?;
        debug!(order_id, status = %http_status, "Gateway status response");

        let parsed: StatusResponse = serde_json::from_str(&body)?;
        parsed.into_verified()
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        let (url, server_key) = {
            let config = self.config.read().await;
            let url = endpoint(&config.snap_base_url, &["v1", "transactions"])?;
            (url, config.server_key.clone())
        };

        let body = SnapRequest {
            transaction_details: TransactionDetails {
                order_id: &request.order_id,
                gross_amount: request.gross_amount,
            },
            customer_details: CustomerDetails {
                first_name: &request.donor_name,
            },
        };

        let response = self
            .http_client
            .post(url)
            .basic_auth(server_key, Some(""))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let http_status = response.status();
        let parsed: SnapResponse = serde_json::from_str(&response.text().await?)?;

        if !http_status.is_success() || parsed.redirect_url.is_empty() {
            return Err(GatewayError::Api {
                status_code: http_status.as_u16().to_string(),
                message: parsed.error_messages.join("; "),
            });
        }
        Ok(CheckoutSession {
            token: parsed.token,
            redirect_url: parsed.redirect_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_status_response() {
        let body = r#"{
            "status_code": "200",
            "status_message": "Success, transaction is found",
            "transaction_id": "513f1f01-c9da-474c-9fc9-d5c64364b709",
            "order_id": "DONATION-1700000000-C7",
            "gross_amount": "50000.00",
            "payment_type": "gopay",
            "transaction_status": "settlement",
            "fraud_status": "accept"
        }"#;
        let verified = serde_json::from_str::<StatusResponse>(body)
            .unwrap()
            .into_verified()
            .unwrap();
        assert_eq!(verified.status, TransactionStatus::Settlement);
        assert_eq!(verified.gross_amount, Decimal::from(50000));
        assert_eq!(verified.order_id, "DONATION-1700000000-C7");
    }

    #[test]
    fn test_missing_transaction_is_api_error() {
        let body = r#"{"status_code":"404","status_message":"Transaction doesn't exist."}"#;
        let err = serde_json::from_str::<StatusResponse>(body)
            .unwrap()
            .into_verified()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api { status_code, .. } if status_code == "404"));
    }

    #[test]
    fn test_garbage_amount() {
        let body = r#"{"status_code":"200","transaction_id":"t","gross_amount":"lots"}"#;
        let err = serde_json::from_str::<StatusResponse>(body)
            .unwrap()
            .into_verified()
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAmount(_)));
    }

    #[test]
    fn test_endpoint_encodes_order_id() {
        let base = Url::parse("https://api.sandbox.midtrans.com").unwrap();
        let url = endpoint(&base, &["v2", "DONATION-1700000000-C7", "status"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sandbox.midtrans.com/v2/DONATION-1700000000-C7/status"
        );

        let url = endpoint(&base, &["v2", "../../v1/x?y=1#z", "status"]).unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert!(url.path().starts_with("/v2/"));
        assert!(url.path().ends_with("/status"));

        let snap = Url::parse("https://app.sandbox.midtrans.com/snap/").unwrap();
        assert_eq!(
            endpoint(&snap, &["v1", "transactions"]).unwrap().as_str(),
            "https://app.sandbox.midtrans.com/snap/v1/transactions"
        );
    }

    #[test]
    fn test_snap_request_shape() {
        let body = SnapRequest {
            transaction_details: TransactionDetails {
                order_id: "DONATION-1700000000-C7",
                gross_amount: 50000,
            },
            customer_details: CustomerDetails { first_name: "Anonymous" },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["transaction_details"]["gross_amount"], 50000);
        assert_eq!(json["customer_details"]["first_name"], "Anonymous");
    }
}
