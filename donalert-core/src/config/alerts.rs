use crate::events::{DEFAULT_CHANNEL_BUFFER, DEFAULT_OUTBOX_CAPACITY};

/// Sizing of the alert hub and its connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertsConfig {
    /// Frames a connection may have queued before the hub evicts it.
    pub outbox_capacity: usize,
    /// Commands the hub may have queued before producers wait.
    pub hub_queue_capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            hub_queue_capacity: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

/// Rules for the public donation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationsConfig {
    /// Donations must be strictly above this amount.
    pub minimum_amount_cents: i64,
}

impl Default for DonationsConfig {
    fn default() -> Self {
        Self {
            minimum_amount_cents: 1000,
        }
    }
}

impl DonationsConfig {
    pub fn accepts(&self, amount_cents: i64) -> bool {
        amount_cents > self.minimum_amount_cents
    }
}
