use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::Donation;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateDonationRequest {
    pub amount: f64,
    #[serde(default, with = "crate::iso_date::option")]
    pub date: Option<Date>,
}

impl CreateDonationRequest {
    pub fn checked_amount(&self) -> Result<f64, AppError> {
        if self.amount.is_finite() && self.amount > 0.0 {
            Ok(self.amount)
        } else {
            Err(AppError::validation("El monto debe ser mayor que cero"))
        }
    }
}

/// Data the client renders into the donation receipt.
#[derive(Debug, Serialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub donation_id: Uuid,
    pub donor_name: String,
    pub donor_email: String,
    pub amount: f64,
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

impl Receipt {
    pub fn for_donation(d: Donation, issued_at: OffsetDateTime) -> Self {
        Self {
            receipt_number: receipt_number(d.id, d.date),
            donation_id: d.id,
            donor_name: d.donor_name.unwrap_or_default(),
            donor_email: d.donor_email.unwrap_or_default(),
            amount: d.amount,
            date: d.date,
            issued_at,
        }
    }
}

/// `SOLVIA-<year>-<first 8 hex digits of the id>`, stable per donation.
pub fn receipt_number(id: Uuid, date: Date) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("SOLVIA-{}-{}", date.year(), &simple[..8])
}
