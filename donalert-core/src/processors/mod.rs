//! Processors for the settlement and alert delivery paths.
//!
//! - `SettlementPipeline`: Receives `VerifyAndSettle`, verifies with the
//!   gateway and reconciles; emits a broadcast on settlement
//! - `SettlementReconciler`: pending → settled transition, at most once
//! - `AlertHub`: Receives `HubCommand`, routes alerts to connections
//! - `DeliveryConnection`: Drains one connection's outbox onto its socket

pub mod alert_hub;
pub mod delivery;
pub mod notification;
pub mod reconciler;

pub use alert_hub::{AlertHub, AlertHubHandle, HubUnavailable};
pub use delivery::{
    CloseReason, ConnectionState, DeliveryConnection, FrameSink, FrameSource, InboundEvent,
    TransportError,
};
pub use notification::{NotificationError, SettlementPipeline, VerifyAndSettle};
pub use reconciler::{
    DonationLedger, LedgerError, ReconcileError, Reconciliation, SettledAlert,
    SettlementReconciler,
};
