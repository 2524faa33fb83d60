//! HTTP and WebSocket handlers.
//!
//! # Endpoints
//!
//! - `POST /api/creators/{username}/donations` – create a pending donation and a checkout
//! - `POST /api/payments/notification`        – payment gateway webhook
//! - `GET  /ws/{secret_token}`                – overlay alert socket

mod donations;
mod notifications;
mod ws;

use crate::state::AppState;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/creators/{username}/donations",
            post(donations::create_donation),
        )
        .route(
            "/api/payments/notification",
            post(notifications::payment_notification),
        )
        .route("/ws/{secret_token}", get(ws::alert_ws))
}

/// JSON error body shared by every handler.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}
