//! SettlementPipeline processor.
//!
//! Handles one payment notification end to end: re-verify the transaction
//! with the gateway, reconcile it against the ledger, and hand the alert to
//! the hub if this notification performed the settlement.
//!
//! The notification body is only used for its order id. Status and amount
//! always come from the gateway's answer.

use crate::gateway::{GatewayError, PaymentGateway};
use crate::processors::alert_hub::AlertHubHandle;
use crate::processors::reconciler::{
    DonationLedger, ReconcileError, Reconciliation, SettledAlert, SettlementReconciler,
};
use kanau::processor::Processor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Verify and settle the donation behind `order_id`.
#[derive(Debug, Clone)]
pub struct VerifyAndSettle {
    pub order_id: String,
    /// Upper bound for the gateway status query.
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("gateway verification timed out after {0:?}")]
    Timeout(Duration),

    #[error("gateway verification failed: {0}")]
    Verification(#[from] GatewayError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

pub struct SettlementPipeline<G, L> {
    gateway: G,
    reconciler: SettlementReconciler<L>,
    hub: AlertHubHandle,
}

impl<G, L> SettlementPipeline<G, L>
where
    G: PaymentGateway,
    L: DonationLedger,
{
    pub fn new(gateway: G, ledger: L, hub: AlertHubHandle) -> Self {
        Self {
            gateway,
            reconciler: SettlementReconciler::new(ledger),
            hub,
        }
    }
}

impl<G, L> Processor<VerifyAndSettle> for SettlementPipeline<G, L>
where
    G: PaymentGateway,
    L: DonationLedger,
{
    type Output = Reconciliation;
    type Error = NotificationError;

    #[tracing::instrument(skip_all, err, fields(order_id = %request.order_id))]
    async fn process(&self, request: VerifyAndSettle) -> Result<Reconciliation, NotificationError> {
        let verified = match tokio::time::timeout(
            request.timeout,
            self.gateway.check_transaction(&request.order_id),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?request.timeout, "Gateway status query timed out");
                return Err(NotificationError::Timeout(request.timeout));
            }
        };

        if verified.order_id != request.order_id {
            return Err(GatewayError::OrderMismatch {
                expected: request.order_id,
                actual: verified.order_id,
            }
            .into());
        }

        let outcome = self.reconciler.reconcile(&verified).await?;

        if let Reconciliation::Settled(SettledAlert { creator_id, alert }) = &outcome {
            debug!(creator_id, "Broadcasting settlement alert");
            self.hub.broadcast(*creator_id, alert.clone()).await;
        }

        Ok(outcome)
    }
}
