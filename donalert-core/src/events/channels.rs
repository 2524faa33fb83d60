//! Channel factories for the alert hub.

use super::types::HubCommand;
use tokio::sync::mpsc;

/// Default buffer size for the hub command channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Default number of encoded alerts a connection may have queued.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

/// Sender handle for hub commands.
pub type HubCommandSender = mpsc::Sender<HubCommand>;
/// Receiver handle for hub commands.
pub type HubCommandReceiver = mpsc::Receiver<HubCommand>;

/// Sending half of a connection's outbox. Owned by the hub once registered.
pub type OutboxSender = mpsc::Sender<String>;
/// Receiving half of a connection's outbox. Owned by the connection.
pub type OutboxReceiver = mpsc::Receiver<String>;

/// Create a new hub command channel.
///
/// Multiple senders can be cloned from the returned sender; the receiver
/// belongs to the one `AlertHub`.
pub fn hub_command_channel(capacity: usize) -> (HubCommandSender, HubCommandReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Create a new connection outbox.
pub fn outbox_channel(capacity: usize) -> (OutboxSender, OutboxReceiver) {
    mpsc::channel(capacity.max(1))
}
