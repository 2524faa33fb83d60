//! Payment gateway abstraction.
//!
//! The settlement path only needs one capability from the gateway: "tell me
//! the authoritative state of the transaction for this order id". Checkout
//! creation is used by the donation form.

mod midtrans;

pub use midtrans::MidtransGateway;

use async_trait::async_trait;
use donalert_sdk::objects::TransactionStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Gateway view of a transaction, as returned by a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    pub order_id: String,
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub gross_amount: Decimal,
}

/// A checkout to open with the gateway for a pending donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub gross_amount: i64,
    pub donor_name: String,
}

/// Where the donor should be sent to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub token: String,
    pub redirect_url: String,
}

/// Errors that can occur while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered, but not with a usable transaction.
    #[error("gateway error: status {status_code}: {message}")]
    Api { status_code: String, message: String },

    /// The gateway answered with an amount that is not a decimal number.
    #[error("invalid gross amount: {0}")]
    InvalidAmount(String),

    /// The status query answered for a different order.
    #[error("gateway answered for order {actual} instead of {expected}")]
    OrderMismatch { expected: String, actual: String },

    /// A configured base URL cannot take path segments.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Query the authoritative status of the transaction for `order_id`.
    async fn check_transaction(&self, order_id: &str) -> Result<VerifiedTransaction, GatewayError>;

    /// Open a hosted checkout for a new donation.
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError>;
}
