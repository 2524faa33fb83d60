use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use donalert_core::entities::creator::GetCreatorByUsername;
use donalert_core::entities::donation::{InsertPendingDonation, donor_name_or_anonymous};
use donalert_core::gateway::{CheckoutRequest, GatewayError, PaymentGateway};
use donalert_core::utils::order_id::donation_order_id;
use donalert_sdk::objects::{CreateDonationRequest, CreateDonationResponse};
use kanau::processor::Processor;

use super::error_response;
use crate::state::AppState;

/// `POST /api/creators/{username}/donations` — start a donation.
///
/// Records a pending donation and opens a gateway checkout for it. The
/// donation only settles later, through the payment notification webhook.
pub(super) async fn create_donation(
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<CreateDonationRequest>, JsonRejection>,
) -> Result<Json<CreateDonationResponse>, DonationApiError> {
    let Json(request) = payload.map_err(DonationApiError::InvalidBody)?;

    let minimum = *state.config.donations.read().await;
    if !minimum.accepts(request.amount_cents) {
        return Err(DonationApiError::AmountTooLow {
            minimum: minimum.minimum_amount_cents,
        });
    }

    let processor = state.processor();
    let creator = processor
        .process(GetCreatorByUsername { username })
        .await
        .map_err(DonationApiError::Database)?
        .ok_or(DonationApiError::CreatorNotFound)?;

    let order_id = donation_order_id(creator.id, time::OffsetDateTime::now_utc());
    let donor_name = donor_name_or_anonymous(&request.donor_name);

    processor
        .process(InsertPendingDonation {
            creator_id: creator.id,
            order_id: order_id.clone(),
            amount_cents: request.amount_cents,
            donor_name: donor_name.clone(),
            donor_message: request.donor_message,
            media_type: request.media_type,
            media_url: request.media_url,
            media_start_seconds: request.media_start_seconds,
            media_end_seconds: request.media_end_seconds,
        })
        .await
        .map_err(DonationApiError::Database)?
        .ok_or_else(|| DonationApiError::OrderIdTaken(order_id.clone()))?;

    tracing::info!(
        %order_id,
        creator_id = creator.id,
        amount_cents = request.amount_cents,
        "Pending donation created"
    );

    let session = state
        .gateway
        .create_checkout(&CheckoutRequest {
            order_id: order_id.clone(),
            gross_amount: request.amount_cents,
            donor_name,
        })
        .await
        .map_err(|e| DonationApiError::Gateway(order_id.clone(), e))?;

    Ok(Json(CreateDonationResponse {
        message: "Payment link created.".to_string(),
        redirect_url: session.redirect_url,
        order_id,
    }))
}

/// Errors that can occur while creating a donation.
#[derive(Debug)]
pub(super) enum DonationApiError {
    InvalidBody(JsonRejection),
    AmountTooLow { minimum: i64 },
    CreatorNotFound,
    /// Another donation to the same creator was created in the same second.
    OrderIdTaken(String),
    Database(sqlx::Error),
    Gateway(String, GatewayError),
}

impl IntoResponse for DonationApiError {
    fn into_response(self) -> Response {
        match self {
            DonationApiError::InvalidBody(e) => {
                error_response(StatusCode::BAD_REQUEST, format!("invalid request: {e}"))
            }
            DonationApiError::AmountTooLow { minimum } => error_response(
                StatusCode::BAD_REQUEST,
                format!("amount_cents must be greater than {minimum}"),
            ),
            DonationApiError::CreatorNotFound => {
                error_response(StatusCode::NOT_FOUND, "creator not found")
            }
            DonationApiError::OrderIdTaken(order_id) => {
                tracing::warn!(%order_id, "Order id already in use");
                error_response(StatusCode::CONFLICT, "please retry in a moment")
            }
            DonationApiError::Database(e) => {
                tracing::error!(error = %e, "Donation API database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "server error")
            }
            DonationApiError::Gateway(order_id, e) => {
                tracing::error!(%order_id, error = %e, "Failed to create gateway checkout");
                error_response(StatusCode::BAD_GATEWAY, "payment gateway error")
            }
        }
    }
}
