//! In-memory stand-ins for the database, the gateway and the socket.

use crate::entities::CreatorId;
use crate::entities::donation::{Donation, DonationStatus};
use crate::gateway::{
    CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, VerifiedTransaction,
};
use crate::processors::delivery::{FrameSink, FrameSource, InboundEvent, TransportError};
use crate::processors::reconciler::{DonationLedger, LedgerError};
use async_trait::async_trait;
use donalert_sdk::objects::{AlertMessage, TransactionStatus};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn sample_donation(order_id: &str, creator_id: CreatorId, amount_cents: i64) -> Donation {
    let created_at = time::PrimitiveDateTime::new(
        time::Date::from_calendar_date(2023, time::Month::November, 14).unwrap(),
        time::Time::MIDNIGHT,
    );
    Donation {
        id: 1,
        creator_id,
        order_id: order_id.to_string(),
        amount_cents,
        donor_name: "Budi".to_string(),
        donor_message: "gg".to_string(),
        media_type: "youtube".to_string(),
        media_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        media_start_seconds: 10,
        media_end_seconds: 25,
        status: DonationStatus::Pending,
        payment_gateway_tx_id: None,
        created_at,
    }
}

pub fn sample_alert(amount_cents: i64) -> AlertMessage {
    AlertMessage {
        donor_name: "Budi".to_string(),
        amount_cents,
        donor_message: "gg".to_string(),
        media_type: "youtube".to_string(),
        media_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        media_start_seconds: 10,
        media_end_seconds: 25,
    }
}

pub fn verified(
    order_id: &str,
    transaction_id: &str,
    status: TransactionStatus,
    amount_cents: i64,
) -> VerifiedTransaction {
    VerifiedTransaction {
        order_id: order_id.to_string(),
        transaction_id: transaction_id.to_string(),
        status,
        gross_amount: Decimal::from(amount_cents),
    }
}

/// Donations keyed by order id. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    rows: Arc<Mutex<HashMap<String, Donation>>>,
    fail_writes: Arc<AtomicBool>,
    transitions: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn with(donations: Vec<Donation>) -> Self {
        let ledger = Self::default();
        {
            let mut rows = ledger.rows.lock().unwrap();
            for donation in donations {
                rows.insert(donation.order_id.clone(), donation);
            }
        }
        ledger
    }

    pub fn get(&self, order_id: &str) -> Option<Donation> {
        self.rows.lock().unwrap().get(order_id).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many pending → settled transitions were performed.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DonationLedger for MemoryLedger {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, LedgerError> {
        tokio::task::yield_now().await;
        Ok(self.get(order_id))
    }

    async fn settle_if_pending(
        &self,
        order_id: &str,
        payment_gateway_tx_id: &str,
    ) -> Result<Option<Donation>, LedgerError> {
        tokio::task::yield_now().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("write refused".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(order_id) {
            Some(row) if row.status == DonationStatus::Pending => {
                row.status = DonationStatus::Settled;
                row.payment_gateway_tx_id = Some(payment_gateway_tx_id.to_string());
                self.transitions.fetch_add(1, Ordering::SeqCst);
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// Gateway that answers from a script. Unknown orders are reported as a 404.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    responses: Arc<Mutex<HashMap<String, VerifiedTransaction>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl ScriptedGateway {
    pub fn respond(&self, transaction: VerifiedTransaction) {
        let order_id = transaction.order_id.clone();
        self.respond_for(&order_id, transaction);
    }

    /// Answer queries for `order_id` with `transaction`, whatever order it names.
    pub fn respond_for(&self, order_id: &str, transaction: VerifiedTransaction) {
        self.responses
            .lock()
            .unwrap()
            .insert(order_id.to_string(), transaction);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn check_transaction(&self, order_id: &str) -> Result<VerifiedTransaction, GatewayError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api {
                status_code: "404".to_string(),
                message: "Transaction doesn't exist.".to_string(),
            })
    }

    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        Ok(CheckoutSession {
            token: format!("token-{}", request.order_id),
            redirect_url: format!("https://checkout.test/{}", request.order_id),
        })
    }
}

/// What the remote end of a [`memory_transport`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerFrame {
    Text(String),
    Close(u16),
}

pub struct MemorySink {
    frames: mpsc::UnboundedSender<PeerFrame>,
    fail: Arc<AtomicBool>,
}

pub struct MemorySource {
    events: mpsc::UnboundedReceiver<InboundEvent>,
}

/// The remote end of a [`memory_transport`].
pub struct Peer {
    pub frames: mpsc::UnboundedReceiver<PeerFrame>,
    events: mpsc::UnboundedSender<InboundEvent>,
    fail: Arc<AtomicBool>,
}

impl Peer {
    pub fn send(&self, event: InboundEvent) {
        let _ = self.events.send(event);
    }

    pub fn close(&self) {
        self.send(InboundEvent::Closed);
    }

    /// Make every later write on the sink fail.
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

pub fn memory_transport() -> (MemorySink, MemorySource, Peer) {
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let fail = Arc::new(AtomicBool::new(false));
    (
        MemorySink {
            frames: frames_tx,
            fail: Arc::clone(&fail),
        },
        MemorySource { events: events_rx },
        Peer {
            frames: frames_rx,
            events: events_tx,
            fail,
        },
    )
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError("broken pipe".to_string()));
        }
        self.frames
            .send(PeerFrame::Text(text))
            .map_err(|_| TransportError("peer gone".to_string()))
    }

    async fn close(&mut self, code: u16, _reason: &str) {
        let _ = self.frames.send(PeerFrame::Close(code));
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_event(&mut self) -> InboundEvent {
        self.events.recv().await.unwrap_or(InboundEvent::Closed)
    }
}
