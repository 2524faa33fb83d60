//! Shared wire types for donalert.
//!
//! Everything here is transport-level: what the overlay widget receives over
//! the alert socket, what the donation form posts, and what the payment
//! gateway sends to the notification webhook.

pub mod objects;
pub mod signature;
