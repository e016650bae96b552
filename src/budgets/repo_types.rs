use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Budget line of a program (at most one per program).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_name: String,
    pub amount: f64,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct BudgetWrite {
    pub program_id: Uuid,
    pub amount: f64,
    pub description: Option<String>,
    pub date: Option<Date>,
}
