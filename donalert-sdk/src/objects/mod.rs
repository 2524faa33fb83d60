pub mod alert;
pub mod donation;
pub mod notification;
pub mod ws;

pub use alert::AlertMessage;
pub use donation::{CreateDonationRequest, CreateDonationResponse};
pub use notification::{PaymentNotification, TransactionStatus};
