//! Payment gateway notification payloads.

use serde::{Deserialize, Serialize};

/// HTTP notification body posted by the payment gateway.
///
/// Only `order_id` is used to drive settlement. The remaining fields are
/// carried for logging and the signature pre-check; amounts and statuses are
/// always re-read from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub transaction_status: TransactionStatus,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
}

/// Transaction status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Cancel,
    Expire,
    Refund,
    PartialRefund,
    Authorize,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Whether the payment has been irrevocably captured.
    pub fn is_settled(self) -> bool {
        matches!(self, TransactionStatus::Settlement | TransactionStatus::Capture)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Capture => write!(f, "capture"),
            TransactionStatus::Settlement => write!(f, "settlement"),
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Deny => write!(f, "deny"),
            TransactionStatus::Cancel => write!(f, "cancel"),
            TransactionStatus::Expire => write!(f, "expire"),
            TransactionStatus::Refund => write!(f, "refund"),
            TransactionStatus::PartialRefund => write!(f, "partial_refund"),
            TransactionStatus::Authorize => write!(f, "authorize"),
            TransactionStatus::Unknown => write!(f, "unknown"),
        }
    }
}
