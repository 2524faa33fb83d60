//! The alert frame pushed to a creator's overlay.

use serde::{Deserialize, Serialize};

/// A settled donation as the overlay sees it.
///
/// Serialized as a flat JSON object, one per WebSocket text frame:
///
/// ```json
/// {"donor_name":"Budi","amount_cents":50000,"donor_message":"gg",
///  "media_type":"youtube","media_url":"https://youtu.be/x",
///  "media_start_seconds":10,"media_end_seconds":25}
/// ```
///
/// The target creator is routing metadata and never part of the frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertMessage {
    pub donor_name: String,
    pub amount_cents: i64,
    pub donor_message: String,
    pub media_type: String,
    pub media_url: String,
    pub media_start_seconds: i32,
    pub media_end_seconds: i32,
}

impl AlertMessage {
    /// Encode as the JSON text carried by one frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
