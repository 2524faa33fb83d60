//! AlertHub processor.
//!
//! The AlertHub is responsible for:
//! - Owning the registry of creator id → current connection
//! - Applying `Register`, `Unregister` and `Broadcast` commands one at a time
//! - Closing a connection's outbox when it is replaced, unregistered or
//!   evicted
//! - Dropping alerts for creators without a connection
//!
//! Nothing outside the hub's own task ever touches the registry. Callers
//! interact through a cloneable [`AlertHubHandle`].

use crate::entities::CreatorId;
use crate::events::{
    ConnectionBinding, ConnectionId, HubCommand, HubCommandReceiver, HubCommandSender,
    hub_command_channel,
};
use donalert_sdk::objects::AlertMessage;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// The hub task has stopped and no longer accepts commands.
#[derive(Debug, Error)]
#[error("alert hub is not running")]
pub struct HubUnavailable;

/// AlertHub routes settled-donation alerts to live overlay connections.
pub struct AlertHub {
    registry: HashMap<CreatorId, ConnectionBinding>,
    command_rx: HubCommandReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

/// Cloneable entry point to a running [`AlertHub`].
#[derive(Clone)]
pub struct AlertHubHandle {
    command_tx: HubCommandSender,
}

impl AlertHub {
    /// Create a new AlertHub and the handle used to reach it.
    ///
    /// # Arguments
    ///
    /// * `queue_capacity` - Commands that may be queued before producers wait
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(queue_capacity: usize, shutdown_rx: watch::Receiver<bool>) -> (Self, AlertHubHandle) {
        let (command_tx, command_rx) = hub_command_channel(queue_capacity);
        let hub = Self {
            registry: HashMap::new(),
            command_rx,
            shutdown_rx,
        };
        (hub, AlertHubHandle { command_tx })
    }

    /// Run the AlertHub until shutdown is signaled or every handle is gone.
    ///
    /// On exit the registry is dropped, which closes every outbox.
    pub async fn run(mut self) {
        info!("AlertHub started");

        loop {
            tokio::select! {
                biased;

                // A dropped shutdown sender counts as a shutdown request.
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("AlertHub received shutdown signal");
                        break;
                    }
                }

                command = self.command_rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        info!("Every hub handle dropped, stopping");
                        break;
                    }
                },
            }
        }

        info!(
            connections = self.registry.len(),
            "AlertHub shutdown complete, closing remaining connections"
        );
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(binding) => self.register(binding),
            HubCommand::Unregister {
                creator_id,
                connection_id,
            } => self.unregister(creator_id, connection_id),
            HubCommand::Broadcast { creator_id, alert } => self.broadcast(creator_id, &alert),
            HubCommand::BoundConnection { creator_id, reply } => {
                let bound = self.registry.get(&creator_id).map(|b| b.connection_id);
                let _ = reply.send(bound);
            }
            HubCommand::ConnectedCreators { reply } => {
                let _ = reply.send(self.registry.len());
            }
        }
    }

    fn register(&mut self, binding: ConnectionBinding) {
        let creator_id = binding.creator_id;
        let connection_id = binding.connection_id;

        // The displaced binding is dropped here, closing its outbox.
        if let Some(previous) = self.registry.insert(creator_id, binding) {
            info!(
                creator_id,
                previous = %previous.connection_id,
                current = %connection_id,
                "Replaced existing connection for creator"
            );
        } else {
            info!(creator_id, connection = %connection_id, "Connection registered");
        }
    }

    fn unregister(&mut self, creator_id: CreatorId, connection_id: ConnectionId) {
        match self.registry.entry(creator_id) {
            Entry::Occupied(entry) if entry.get().connection_id == connection_id => {
                entry.remove();
                info!(creator_id, connection = %connection_id, "Connection unregistered");
            }
            _ => {
                debug!(
                    creator_id,
                    connection = %connection_id,
                    "Ignoring unregister from a connection that is not current"
                );
            }
        }
    }

    fn broadcast(&mut self, creator_id: CreatorId, alert: &AlertMessage) {
        let Some(binding) = self.registry.get(&creator_id) else {
            debug!(creator_id, "No connection for creator, dropping alert");
            return;
        };

        let frame = match alert.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(creator_id, error = %e, "Failed to encode alert");
                return;
            }
        };

        match binding.outbox.try_send(frame) {
            Ok(()) => {
                debug!(creator_id, connection = %binding.connection_id, "Alert queued");
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    creator_id,
                    connection = %binding.connection_id,
                    "Connection outbox full, dropping alert and evicting connection"
                );
                self.registry.remove(&creator_id);
            }
            Err(TrySendError::Closed(_)) => {
                info!(
                    creator_id,
                    connection = %binding.connection_id,
                    "Connection already gone, removing binding"
                );
                self.registry.remove(&creator_id);
            }
        }
    }
}

impl AlertHubHandle {
    /// Bind a connection as the current one for its creator.
    pub async fn register(&self, binding: ConnectionBinding) -> Result<(), HubUnavailable> {
        self.command_tx
            .send(HubCommand::Register(binding))
            .await
            .map_err(|_| HubUnavailable)
    }

    /// Ask the hub to drop `connection_id` if it is still current.
    pub async fn unregister(&self, creator_id: CreatorId, connection_id: ConnectionId) {
        let command = HubCommand::Unregister {
            creator_id,
            connection_id,
        };
        if self.command_tx.send(command).await.is_err() {
            debug!(creator_id, connection = %connection_id, "Hub stopped before unregister");
        }
    }

    /// Fire-and-forget delivery of an alert to a creator's overlay.
    pub async fn broadcast(&self, creator_id: CreatorId, alert: AlertMessage) {
        if self
            .command_tx
            .send(HubCommand::Broadcast { creator_id, alert })
            .await
            .is_err()
        {
            warn!(creator_id, "Hub stopped, alert dropped");
        }
    }

    /// The connection currently bound for `creator_id`.
    ///
    /// Answered from inside the hub loop, so it reflects every command sent
    /// through this handle before the call.
    pub async fn bound_connection(&self, creator_id: CreatorId) -> Option<ConnectionId> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(HubCommand::BoundConnection { creator_id, reply })
            .await
            .ok()?;
        rx.await.ok().flatten()
    }

    /// Number of creators with a live connection, `None` if the hub stopped.
    pub async fn connected_creators(&self) -> Option<usize> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(HubCommand::ConnectedCreators { reply })
            .await
            .ok()?;
        rx.await.ok()
    }
}
