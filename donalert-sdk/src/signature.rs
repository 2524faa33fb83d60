//! Notification signature check for the payment gateway webhook.
//!
//! The gateway signs every notification as
//!
//! ```text
//! signature_key = hex(SHA-512(order_id ‖ status_code ‖ gross_amount ‖ server_key))
//! ```
//!
//! A valid signature only proves the body came from someone holding the
//! server key. Settlement is still decided from a fresh status query.

use crate::objects::PaymentNotification;

/// Errors produced by signature checks.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
}

/// Compute the expected signature key for a notification.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    hex::encode(notification_digest(
        order_id,
        status_code,
        gross_amount,
        server_key,
    ))
}

fn notification_digest(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> ring::digest::Digest {
    let mut ctx = ring::digest::Context::new(&ring::digest::SHA512);
    ctx.update(order_id.as_bytes());
    ctx.update(status_code.as_bytes());
    ctx.update(gross_amount.as_bytes());
    ctx.update(server_key.as_bytes());
    ctx.finish()
}

/// Verify the `signature_key` carried by a notification.
pub fn verify_notification(
    notification: &PaymentNotification,
    server_key: &str,
) -> Result<(), SignatureError> {
    let provided =
        hex::decode(&notification.signature_key).map_err(|_| SignatureError::InvalidHex)?;
    let expected = notification_digest(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        server_key,
    );

    ring::constant_time::verify_slices_are_equal(&provided, expected.as_ref())
        .map_err(|_| SignatureError::SignatureMismatch)
}
