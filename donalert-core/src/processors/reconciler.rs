//! SettlementReconciler.
//!
//! Turns a gateway-verified transaction into at most one pending → settled
//! transition per order id:
//! - Looks up the donation by order id
//! - Ignores transactions that are not captured or settled
//! - Rejects verified amounts that differ from the recorded amount
//! - Performs the conditional transition and builds the alert for the one
//!   caller that wins it
//!
//! The conditional update in [`DonationLedger::settle_if_pending`] is the
//! only idempotency gate. The earlier lookup is used for existence and amount
//! checks, never to decide whether to write.

use crate::entities::CreatorId;
use crate::entities::donation::{Donation, GetDonationByOrderId, SettlePendingDonation};
use crate::framework::DatabaseProcessor;
use crate::gateway::VerifiedTransaction;
use async_trait::async_trait;
use donalert_sdk::objects::{AlertMessage, TransactionStatus};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the donation store.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations the reconciler relies on.
#[async_trait]
pub trait DonationLedger: Send + Sync {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, LedgerError>;

    /// Atomically set `status = settled` and the gateway transaction id iff
    /// the donation is still pending. Returns the settled row only to the
    /// caller that performed the transition.
    async fn settle_if_pending(
        &self,
        order_id: &str,
        payment_gateway_tx_id: &str,
    ) -> Result<Option<Donation>, LedgerError>;
}

#[async_trait]
impl DonationLedger for DatabaseProcessor {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, LedgerError> {
        let donation = self
            .process(GetDonationByOrderId {
                order_id: order_id.to_string(),
            })
            .await?;
        Ok(donation)
    }

    async fn settle_if_pending(
        &self,
        order_id: &str,
        payment_gateway_tx_id: &str,
    ) -> Result<Option<Donation>, LedgerError> {
        let donation = self
            .process(SettlePendingDonation {
                order_id: order_id.to_string(),
                payment_gateway_tx_id: payment_gateway_tx_id.to_string(),
            })
            .await?;
        Ok(donation)
    }
}

/// An alert produced by a successful settlement, with its routing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledAlert {
    pub creator_id: CreatorId,
    pub alert: AlertMessage,
}

/// Non-error outcomes of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// This call moved the donation to settled.
    Settled(SettledAlert),
    /// The donation was already settled. Nothing changed.
    Duplicate,
    /// The gateway does not consider the payment final. Nothing changed.
    NotSettled(TransactionStatus),
}

/// Errors that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("no donation for order {0}")]
    NotFound(String),

    #[error("amount mismatch for order {order_id}: recorded {recorded}, verified {verified}")]
    AmountMismatch {
        order_id: String,
        recorded: i64,
        verified: Decimal,
    },

    #[error("storage error: {0}")]
    Storage(#[from] LedgerError),
}

pub struct SettlementReconciler<L> {
    ledger: L,
}

impl<L: DonationLedger> SettlementReconciler<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Apply a verified transaction to the donation it belongs to.
    pub async fn reconcile(
        &self,
        verified: &VerifiedTransaction,
    ) -> Result<Reconciliation, ReconcileError> {
        let order_id = verified.order_id.as_str();

        let donation = self
            .ledger
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(order_id.to_string()))?;

        if !verified.status.is_settled() {
            debug!(order_id, status = %verified.status, "Transaction not settled yet");
            return Ok(Reconciliation::NotSettled(verified.status));
        }

        if Decimal::from(donation.amount_cents) != verified.gross_amount {
            warn!(
                order_id,
                recorded = donation.amount_cents,
                verified = %verified.gross_amount,
                transaction_id = %verified.transaction_id,
                "Verified amount does not match recorded donation"
            );
            return Err(ReconcileError::AmountMismatch {
                order_id: order_id.to_string(),
                recorded: donation.amount_cents,
                verified: verified.gross_amount,
            });
        }

        match self
            .ledger
            .settle_if_pending(order_id, &verified.transaction_id)
            .await?
        {
            Some(settled) => {
                info!(
                    order_id,
                    creator_id = settled.creator_id,
                    amount_cents = settled.amount_cents,
                    transaction_id = %verified.transaction_id,
                    "Donation settled"
                );
                Ok(Reconciliation::Settled(SettledAlert {
                    creator_id: settled.creator_id,
                    alert: settled.to_alert(),
                }))
            }
            None => {
                info!(order_id, "Duplicate settlement notification, already settled");
                Ok(Reconciliation::Duplicate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::donation::DonationStatus;
    use crate::testing::{MemoryLedger, sample_donation, verified};
    use std::sync::Arc;

    const ORDER: &str = "DONATION-1700000000-C7";

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger.clone());

        let outcome = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
            .await
            .unwrap();

        let Reconciliation::Settled(settled) = outcome else {
            panic!("expected settlement, got {outcome:?}");
        };
        assert_eq!(settled.creator_id, 7);
        assert_eq!(settled.alert.amount_cents, 50000);

        let row = ledger.get(ORDER).unwrap();
        assert_eq!(row.status, DonationStatus::Settled);
        assert_eq!(row.payment_gateway_tx_id.as_deref(), Some("tx-1"));
    }

    #[tokio::test]
    async fn test_capture_also_settles() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger);
        let outcome = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Capture, 50000))
            .await
            .unwrap();
        assert!(matches!(outcome, Reconciliation::Settled(_)));
    }

    #[tokio::test]
    async fn test_redelivery_is_duplicate_and_keeps_tx_id() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger.clone());

        reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
            .await
            .unwrap();
        let again = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
            .await
            .unwrap();
        let different = reconciler
            .reconcile(&verified(ORDER, "tx-2", TransactionStatus::Capture, 50000))
            .await
            .unwrap();

        assert_eq!(again, Reconciliation::Duplicate);
        assert_eq!(different, Reconciliation::Duplicate);
        let row = ledger.get(ORDER).unwrap();
        assert_eq!(row.status, DonationStatus::Settled);
        assert_eq!(row.payment_gateway_tx_id.as_deref(), Some("tx-1"));
        assert_eq!(ledger.transitions(), 1);
    }

    #[tokio::test]
    async fn test_pending_status_is_not_settled() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger.clone());

        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Expire,
            TransactionStatus::Deny,
            TransactionStatus::Unknown,
        ] {
            let outcome = reconciler
                .reconcile(&verified(ORDER, "tx-1", status, 50000))
                .await
                .unwrap();
            assert_eq!(outcome, Reconciliation::NotSettled(status));
        }
        assert_eq!(ledger.get(ORDER).unwrap().status, DonationStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let reconciler = SettlementReconciler::new(MemoryLedger::default());
        let err = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(order) if order == ORDER));
    }

    #[tokio::test]
    async fn test_amount_mismatch_leaves_row_pending() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger.clone());

        let err = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 5000))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::AmountMismatch { recorded: 50000, .. }));

        let mut fractional = verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000);
        fractional.gross_amount = Decimal::new(5000001, 2);
        assert!(reconciler.reconcile(&fractional).await.is_err());

        let row = ledger.get(ORDER).unwrap();
        assert_eq!(row.status, DonationStatus::Pending);
        assert_eq!(row.payment_gateway_tx_id, None);
    }

    #[tokio::test]
    async fn test_trailing_zero_amount_matches() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = SettlementReconciler::new(ledger);
        let mut with_cents = verified(ORDER, "tx-1", TransactionStatus::Settlement, 0);
        with_cents.gross_amount = Decimal::new(5000000, 2);
        assert!(matches!(
            reconciler.reconcile(&with_cents).await.unwrap(),
            Reconciliation::Settled(_)
        ));
    }

    #[tokio::test]
    async fn test_write_failure_leaves_row_pending() {
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        ledger.fail_writes(true);
        let reconciler = SettlementReconciler::new(ledger.clone());

        let err = reconciler
            .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Storage(LedgerError::Unavailable(_))));
        assert_eq!(ledger.get(ORDER).unwrap().status, DonationStatus::Pending);

        // A later redelivery settles normally.
        ledger.fail_writes(false);
        assert!(matches!(
            reconciler
                .reconcile(&verified(ORDER, "tx-1", TransactionStatus::Settlement, 50000))
                .await
                .unwrap(),
            Reconciliation::Settled(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_settle_once() {
        const N: usize = 32;
        let ledger = MemoryLedger::with(vec![sample_donation(ORDER, 7, 50000)]);
        let reconciler = Arc::new(SettlementReconciler::new(ledger.clone()));

        let tasks: Vec<_> = (0..N)
            .map(|i| {
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    let tx = format!("tx-{i}");
                    reconciler
                        .reconcile(&verified(ORDER, &tx, TransactionStatus::Settlement, 50000))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut settled = Vec::new();
        let mut duplicates = 0;
        for task in tasks {
            match task.await.unwrap() {
                Reconciliation::Settled(alert) => settled.push(alert),
                Reconciliation::Duplicate => duplicates += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(settled.len(), 1);
        assert_eq!(duplicates, N - 1);
        assert_eq!(ledger.transitions(), 1);
    }
}
