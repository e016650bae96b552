use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_name: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub image: Option<String>,
    pub video: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub end_date: Option<Date>,
    pub image: Option<String>,
    pub video: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<Date>,
    pub image: Option<String>,
    pub video: Option<String>,
}
