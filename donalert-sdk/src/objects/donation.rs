use serde::{Deserialize, Serialize};

/// Body of `POST /api/creators/{username}/donations`.
///
/// Sent by the public donation page on behalf of the donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDonationRequest {
    pub amount_cents: i64,
    #[serde(default)]
    pub donor_name: String,
    #[serde(default)]
    pub donor_message: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub media_start_seconds: i32,
    #[serde(default)]
    pub media_end_seconds: i32,
}

/// Response returned once the gateway checkout has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDonationResponse {
    pub message: String,
    /// Where the donor completes the payment.
    pub redirect_url: String,
    pub order_id: String,
}
