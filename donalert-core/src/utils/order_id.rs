use crate::entities::CreatorId;

/// Order id for a new donation: `DONATION-{unix seconds}-C{creator id}`.
///
/// Two donations to the same creator in the same second collide; the insert
/// rejects the second one and the donor retries.
pub fn donation_order_id(creator_id: CreatorId, at: time::OffsetDateTime) -> String {
    format!("DONATION-{}-C{}", at.unix_timestamp(), creator_id)
}
