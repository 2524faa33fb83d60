use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use donalert_core::processors::{NotificationError, ReconcileError, Reconciliation, VerifyAndSettle};
use donalert_sdk::objects::PaymentNotification;
use donalert_sdk::signature::verify_notification;
use kanau::processor::Processor;
use serde::Serialize;

use super::error_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub(super) struct NotificationAck {
    status: &'static str,
}

/// `POST /api/payments/notification` — payment gateway webhook.
///
/// The body is only trusted for its `order_id`. Everything that decides the
/// settlement is re-read from the gateway before the donation is touched.
/// Any non-2xx answer makes the gateway deliver the notification again.
pub(super) async fn payment_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationAck>, NotificationApiError> {
    let notification: PaymentNotification =
        serde_json::from_slice(&body).map_err(NotificationApiError::Malformed)?;
    if notification.order_id.trim().is_empty() {
        return Err(NotificationApiError::MissingOrderId);
    }

    let (verify_signature, server_key, timeout) = {
        let gateway = state.config.gateway.read().await;
        (
            gateway.verify_signature,
            gateway.server_key.clone(),
            gateway.verify_timeout,
        )
    };

    if verify_signature && verify_notification(&notification, &server_key).is_err() {
        tracing::warn!(
            order_id = %notification.order_id,
            transaction_id = %notification.transaction_id,
            "Notification signature mismatch"
        );
        return Err(NotificationApiError::BadSignature);
    }

    tracing::debug!(
        order_id = %notification.order_id,
        reported_status = %notification.transaction_status,
        "Payment notification received"
    );

    let outcome = state
        .settlement
        .process(VerifyAndSettle {
            order_id: notification.order_id,
            timeout,
        })
        .await?;

    Ok(Json(NotificationAck {
        status: acknowledgement(&outcome),
    }))
}

fn acknowledgement(outcome: &Reconciliation) -> &'static str {
    match outcome {
        Reconciliation::Settled(_) => "ok",
        Reconciliation::Duplicate => "ok (duplicate)",
        Reconciliation::NotSettled(_) => "ok (not settled)",
    }
}

/// Errors that can occur in the webhook handler.
#[derive(Debug)]
pub(super) enum NotificationApiError {
    /// The body is not a notification.
    Malformed(serde_json::Error),
    MissingOrderId,
    /// `signature_key` does not match the configured server key.
    BadSignature,
    Settlement(NotificationError),
}

impl From<NotificationError> for NotificationApiError {
    fn from(e: NotificationError) -> Self {
        NotificationApiError::Settlement(e)
    }
}

fn settlement_status(e: &NotificationError) -> StatusCode {
    match e {
        NotificationError::Reconcile(ReconcileError::NotFound(_)) => StatusCode::NOT_FOUND,
        NotificationError::Reconcile(ReconcileError::AmountMismatch { .. }) => StatusCode::FORBIDDEN,
        NotificationError::Reconcile(ReconcileError::Storage(_))
        | NotificationError::Timeout(_)
        | NotificationError::Verification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for NotificationApiError {
    fn into_response(self) -> Response {
        match self {
            NotificationApiError::Malformed(e) => {
                tracing::warn!(error = %e, "Malformed payment notification");
                error_response(StatusCode::BAD_REQUEST, "invalid notification format")
            }
            NotificationApiError::MissingOrderId => {
                error_response(StatusCode::BAD_REQUEST, "missing order_id")
            }
            NotificationApiError::BadSignature => {
                error_response(StatusCode::FORBIDDEN, "invalid signature")
            }
            NotificationApiError::Settlement(e) => {
                let status = settlement_status(&e);
                match status {
                    StatusCode::NOT_FOUND => {
                        tracing::warn!(error = %e, "Notification for unknown donation");
                        error_response(status, "donation not found")
                    }
                    StatusCode::FORBIDDEN => error_response(status, "amount mismatch"),
                    _ => {
                        tracing::error!(error = %e, "Failed to settle donation");
                        error_response(status, "failed to process notification")
                    }
                }
            }
        }
    }
}
