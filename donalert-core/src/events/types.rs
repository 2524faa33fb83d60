//! Hub command definitions.

use super::channels::OutboxSender;
use crate::entities::CreatorId;
use donalert_sdk::objects::AlertMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one delivery connection.
///
/// Two connections for the same creator always have different ids, which is
/// what lets the hub ignore an unregister from a superseded connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What the hub keeps for a registered connection.
///
/// Dropping the binding drops the only sender of the outbox, which closes
/// it and ends the connection's outbound loop.
#[derive(Debug)]
pub struct ConnectionBinding {
    pub connection_id: ConnectionId,
    pub creator_id: CreatorId,
    pub outbox: OutboxSender,
}

/// Requests accepted by the alert hub, applied strictly in arrival order.
#[derive(Debug)]
pub enum HubCommand {
    /// Bind a connection as current for its creator, closing any previous one.
    Register(ConnectionBinding),
    /// Remove the binding if `connection_id` is still the current one.
    Unregister {
        creator_id: CreatorId,
        connection_id: ConnectionId,
    },
    /// Deliver an alert to the creator's current connection, if any.
    Broadcast {
        creator_id: CreatorId,
        alert: AlertMessage,
    },
    /// Report which connection is currently bound for a creator.
    BoundConnection {
        creator_id: CreatorId,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    /// Report how many creators currently have a bound connection.
    ConnectedCreators { reply: oneshot::Sender<usize> },
}
