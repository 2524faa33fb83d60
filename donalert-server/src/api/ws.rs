use async_trait::async_trait;
use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use donalert_core::entities::CreatorId;
use donalert_core::entities::creator::GetCreatorBySecretToken;
use donalert_core::processors::{
    AlertHubHandle, DeliveryConnection, FrameSink, FrameSource, InboundEvent, TransportError,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use kanau::processor::Processor;

use super::error_response;
use crate::state::AppState;

/// `GET /ws/{secret_token}` — overlay alert socket.
///
/// The token is resolved before the upgrade; an unknown token gets a plain
/// 401 and no socket. After the upgrade the server pushes one
/// `AlertMessage` text frame per settled donation and ignores whatever the
/// overlay sends.
pub(super) async fn alert_ws(
    State(state): State<AppState>,
    Path(secret_token): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, WsAuthError> {
    let creator = state
        .processor()
        .process(GetCreatorBySecretToken { secret_token })
        .await
        .map_err(WsAuthError::Database)?
        .ok_or(WsAuthError::Unauthorized)?;

    let capacity = state.config.alerts.read().await.outbox_capacity;
    let hub = state.hub.clone();
    tracing::info!(creator_id = creator.id, username = %creator.username, "Overlay connecting");

    Ok(ws.on_upgrade(move |socket| serve_overlay(socket, hub, creator.id, capacity)))
}

async fn serve_overlay(socket: WebSocket, hub: AlertHubHandle, creator_id: CreatorId, capacity: usize) {
    let (sink, stream) = socket.split();
    let mut connection = DeliveryConnection::open(creator_id, hub, capacity);
    connection
        .serve(WsFrameSink(sink), WsFrameSource(stream))
        .await;
}

struct WsFrameSink(SplitSink<WebSocket, Message>);

struct WsFrameSource(SplitStream<WebSocket>);

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError(e.to_string()))
    }

    async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code,
            reason: reason.to_owned().into(),
        };
        let _ = self.0.send(Message::Close(Some(frame))).await;
        let _ = self.0.close().await;
    }
}

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn next_event(&mut self) -> InboundEvent {
        match self.0.next().await {
            None | Some(Ok(Message::Close(_))) => InboundEvent::Closed,
            Some(Ok(_)) => InboundEvent::Frame,
            Some(Err(e)) => InboundEvent::Failed(e.to_string()),
        }
    }
}

/// Errors that can occur before the upgrade.
#[derive(Debug)]
pub(super) enum WsAuthError {
    /// The secret token does not belong to any creator.
    Unauthorized,
    Database(sqlx::Error),
}

impl IntoResponse for WsAuthError {
    fn into_response(self) -> Response {
        match self {
            WsAuthError::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "invalid token"),
            WsAuthError::Database(e) => {
                tracing::error!(error = %e, "WS: failed to resolve secret token");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_is_unauthorized() {
        assert_eq!(
            WsAuthError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
