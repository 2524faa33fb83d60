pub mod creator;
pub mod donation;

/// Numeric creator id; the only creator identity the alert path knows about.
pub type CreatorId = i64;
