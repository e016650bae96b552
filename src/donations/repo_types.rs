use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Donation joined with its donor; donor fields are `None` once the donor
/// account is gone.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub amount: f64,
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
