//! Commands and channels for the alert path.
//!
//! # Flow
//!
//! 1. A connection is authenticated and calls `AlertHubHandle::register`
//!    with a [`ConnectionBinding`] that owns the sending half of its outbox.
//! 2. The settlement pipeline calls `AlertHubHandle::broadcast` after the
//!    one successful pending → settled transition.
//! 3. The hub forwards the encoded alert into the bound outbox, or drops it.
//! 4. The connection drains its outbox onto the socket, and on disconnect
//!    calls `AlertHubHandle::unregister`.
//!
//! Every registry change travels through the hub's single command channel,
//! so the hub sees one total order of registers, unregisters and broadcasts.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, DEFAULT_OUTBOX_CAPACITY, HubCommandReceiver, HubCommandSender,
    OutboxReceiver, OutboxSender, hub_command_channel, outbox_channel,
};

pub use types::{ConnectionBinding, ConnectionId, HubCommand};
