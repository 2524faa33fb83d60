use crate::entities::CreatorId;
use crate::framework::DatabaseProcessor;
use donalert_sdk::objects::AlertMessage;
use kanau::processor::Processor;

/// Donor name used when the donation form leaves it blank.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Donation {
    pub id: i64,
    pub creator_id: CreatorId,
    pub order_id: String,
    pub amount_cents: i64,
    pub donor_name: String,
    pub donor_message: String,
    pub media_type: String,
    pub media_url: String,
    pub media_start_seconds: i32,
    pub media_end_seconds: i32,
    pub status: DonationStatus,
    pub payment_gateway_tx_id: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

/// Settlement state. Only ever moves from `Pending` to `Settled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "donation_status")]
pub enum DonationStatus {
    Pending,
    Settled,
}

impl Donation {
    /// Build the overlay alert for this donation.
    pub fn to_alert(&self) -> AlertMessage {
        AlertMessage {
            donor_name: self.donor_name.clone(),
            amount_cents: self.amount_cents,
            donor_message: self.donor_message.clone(),
            media_type: self.media_type.clone(),
            media_url: self.media_url.clone(),
            media_start_seconds: self.media_start_seconds,
            media_end_seconds: self.media_end_seconds,
        }
    }
}

const DONATION_COLUMNS: &str = r#"
    id,
    creator_id,
    order_id,
    amount_cents,
    donor_name,
    donor_message,
    media_type,
    media_url,
    media_start_seconds,
    media_end_seconds,
    status,
    payment_gateway_tx_id,
    created_at
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Insert a new pending donation.
///
/// Returns `None` if a donation with the same `order_id` already exists;
/// the existing row is left alone.
pub struct InsertPendingDonation {
    pub creator_id: CreatorId,
    pub order_id: String,
    pub amount_cents: i64,
    pub donor_name: String,
    pub donor_message: String,
    pub media_type: String,
    pub media_url: String,
    pub media_start_seconds: i32,
    pub media_end_seconds: i32,
}

impl Processor<InsertPendingDonation> for DatabaseProcessor {
    type Output = Option<Donation>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertPendingDonation")]
    async fn process(&self, insert: InsertPendingDonation) -> Result<Option<Donation>, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO donations
              (creator_id, order_id, amount_cents, donor_name, donor_message,
               media_type, media_url, media_start_seconds, media_end_seconds, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            ON CONFLICT (order_id) DO NOTHING
            RETURNING {DONATION_COLUMNS}
            "#
        );
        let donation = sqlx::query_as::<_, Donation>(&sql)
            .bind(insert.creator_id)
            .bind(insert.order_id)
            .bind(insert.amount_cents)
            .bind(insert.donor_name)
            .bind(insert.donor_message)
            .bind(insert.media_type)
            .bind(insert.media_url)
            .bind(insert.media_start_seconds)
            .bind(insert.media_end_seconds)
            .fetch_optional(&self.pool)
            .await?;
        Ok(donation)
    }
}

#[derive(Debug, Clone)]
pub struct GetDonationByOrderId {
    pub order_id: String,
}

impl Processor<GetDonationByOrderId> for DatabaseProcessor {
    type Output = Option<Donation>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetDonationByOrderId")]
    async fn process(&self, query: GetDonationByOrderId) -> Result<Option<Donation>, sqlx::Error> {
        let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE order_id = $1");
        let donation = sqlx::query_as::<_, Donation>(&sql)
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(donation)
    }
}

#[derive(Debug, Clone)]
/// Move a donation from pending to settled in one conditional statement.
///
/// Returns the settled row if this call performed the transition, `None` if
/// the row was no longer pending (or does not exist). The `status = 'pending'`
/// predicate is evaluated by Postgres under the row lock, so two concurrent
/// calls can never both see a row back.
pub struct SettlePendingDonation {
    pub order_id: String,
    pub payment_gateway_tx_id: String,
}

impl Processor<SettlePendingDonation> for DatabaseProcessor {
    type Output = Option<Donation>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SettlePendingDonation")]
    async fn process(&self, update: SettlePendingDonation) -> Result<Option<Donation>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE donations
            SET status = 'settled', payment_gateway_tx_id = $2
            WHERE order_id = $1 AND status = 'pending'
            RETURNING {DONATION_COLUMNS}
            "#
        );
        let donation = sqlx::query_as::<_, Donation>(&sql)
            .bind(update.order_id)
            .bind(update.payment_gateway_tx_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(donation)
    }
}

/// Apply the default donor name to blank input.
pub fn donor_name_or_anonymous(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        ANONYMOUS_DONOR.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_donation;

    #[test]
    fn test_alert_mirrors_donation() {
        let donation = sample_donation("DONATION-1700000000-C7", 7, 50000);
        let alert = donation.to_alert();
        assert_eq!(alert.amount_cents, 50000);
        assert_eq!(alert.donor_name, donation.donor_name);
        assert_eq!(alert.media_url, donation.media_url);
        assert_eq!(alert.media_start_seconds, donation.media_start_seconds);
    }

    #[test]
    fn test_donor_name_default() {
        assert_eq!(donor_name_or_anonymous(""), "Anonymous");
        assert_eq!(donor_name_or_anonymous("   "), "Anonymous");
        assert_eq!(donor_name_or_anonymous(" Sari "), "Sari");
    }
}
