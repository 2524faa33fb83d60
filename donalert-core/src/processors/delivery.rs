//! DeliveryConnection: one overlay socket bound to one creator.
//!
//! A connection is transport-agnostic. The server adapts its WebSocket halves
//! to [`FrameSink`] and [`FrameSource`]; tests use in-memory ones.
//!
//! Lifecycle: `Open` → `Registered` → `Closed`. While registered, two loops
//! run concurrently:
//!
//! - outbound: drain the outbox and write one text frame per alert, until a
//!   write fails or the hub closes the outbox;
//! - inbound: wait for a peer close or read error. Incoming data frames are
//!   ignored.
//!
//! Whichever loop ends first ends the connection. The connection then asks
//! the hub to unregister it; the hub ignores that request if a newer
//! connection has already taken over.

use crate::entities::CreatorId;
use crate::events::{ConnectionBinding, ConnectionId, OutboxReceiver, OutboxSender, outbox_channel};
use crate::processors::alert_hub::{AlertHubHandle, HubUnavailable};
use async_trait::async_trait;
use donalert_sdk::objects::ws::WsCloseCode;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`DeliveryConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Authenticated, not yet bound in the hub.
    Open,
    /// Bound in the hub; loops running.
    Registered,
    /// Terminal.
    Closed,
}

/// What the inbound side observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Any data, ping or pong frame. Carries nothing the server acts on.
    Frame,
    /// The peer closed the socket or the stream ended.
    Closed,
    /// Reading from the socket failed.
    Failed(String),
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    ReadFailed(String),
    WriteFailed(String),
    /// Replaced by a newer connection, evicted for falling behind,
    /// unregistered, or the hub shut down.
    ClosedByHub,
    /// The hub was not running when the connection tried to register.
    HubUnavailable,
}

#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Outgoing half of a transport.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Best-effort close frame.
    async fn close(&mut self, code: u16, reason: &str);
}

/// Incoming half of a transport.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_event(&mut self) -> InboundEvent;
}

pub struct DeliveryConnection {
    id: ConnectionId,
    creator_id: CreatorId,
    state: ConnectionState,
    hub: AlertHubHandle,
    /// Held until registration hands it to the hub.
    outbox_tx: Option<OutboxSender>,
    outbox_rx: OutboxReceiver,
}

impl DeliveryConnection {
    /// Create an authenticated connection for `creator_id` with an outbox of
    /// `capacity` alerts.
    pub fn open(creator_id: CreatorId, hub: AlertHubHandle, capacity: usize) -> Self {
        let (outbox_tx, outbox_rx) = outbox_channel(capacity);
        Self {
            id: ConnectionId::next(),
            creator_id,
            state: ConnectionState::Open,
            hub,
            outbox_tx: Some(outbox_tx),
            outbox_rx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Hand the outbox to the hub and become the creator's current
    /// connection. Does nothing unless the connection is `Open`.
    pub async fn register(&mut self) -> Result<(), HubUnavailable> {
        let Some(outbox) = self.outbox_tx.take() else {
            return Ok(());
        };
        let binding = ConnectionBinding {
            connection_id: self.id,
            creator_id: self.creator_id,
            outbox,
        };
        match self.hub.register(binding).await {
            Ok(()) => {
                self.state = ConnectionState::Registered;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(e)
            }
        }
    }

    /// Drive the connection until it closes.
    ///
    /// Registers first if still `Open`. Always leaves the connection
    /// `Closed`.
    pub async fn serve<K, S>(&mut self, mut sink: K, mut source: S) -> CloseReason
    where
        K: FrameSink,
        S: FrameSource,
    {
        if self.state == ConnectionState::Open && self.register().await.is_err() {
            warn!(creator_id = self.creator_id, connection = %self.id, "Alert hub unavailable");
            sink.close(WsCloseCode::NORMAL, "server shutting down").await;
            return CloseReason::HubUnavailable;
        }
        if self.state == ConnectionState::Closed {
            return CloseReason::ClosedByHub;
        }

        let reason = {
            let outbox_rx = &mut self.outbox_rx;
            let sink = &mut sink;
            let source = &mut source;

            let outbound = async move {
                while let Some(frame) = outbox_rx.recv().await {
                    if let Err(e) = sink.send_text(frame).await {
                        return CloseReason::WriteFailed(e.0);
                    }
                }
                CloseReason::ClosedByHub
            };

            let inbound = async move {
                loop {
                    match source.next_event().await {
                        InboundEvent::Frame => continue,
                        InboundEvent::Closed => return CloseReason::PeerClosed,
                        InboundEvent::Failed(e) => return CloseReason::ReadFailed(e),
                    }
                }
            };

            tokio::select! {
                reason = outbound => reason,
                reason = inbound => reason,
            }
        };

        // Stale if the hub already replaced or evicted us; the hub decides.
        self.hub.unregister(self.creator_id, self.id).await;
        self.outbox_rx.close();
        self.state = ConnectionState::Closed;

        match &reason {
            CloseReason::ClosedByHub => {
                sink.close(WsCloseCode::NORMAL, "closed by server").await;
            }
            CloseReason::PeerClosed | CloseReason::ReadFailed(_) => {
                sink.close(WsCloseCode::NORMAL, "").await;
            }
            CloseReason::WriteFailed(_) | CloseReason::HubUnavailable => {}
        }

        match &reason {
            CloseReason::ReadFailed(e) | CloseReason::WriteFailed(e) => {
                debug!(creator_id = self.creator_id, connection = %self.id, error = %e, "Transport error");
            }
            _ => {}
        }
        info!(
            creator_id = self.creator_id,
            connection = %self.id,
            reason = ?reason,
            "Connection closed"
        );
        reason
    }
}
