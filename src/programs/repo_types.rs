use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::assignments::repo_types::TaskStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "program_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    Active,
    Paused,
    Finished,
}

/// Program joined with its coordinator's name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Program {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub start_date: Date,
    #[serde(with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub objectives: Option<String>,
    pub coordinator_charge: Uuid,
    pub coordinator_name: String,
    pub image: Option<String>,
    pub status: ProgramStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProgram {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub objectives: Option<String>,
    pub coordinator_charge: Uuid,
    pub status: ProgramStatus,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProgramChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub objectives: Option<String>,
    pub coordinator_charge: Option<Uuid>,
    pub status: Option<ProgramStatus>,
}

/// Volunteer or beneficiary of a program, as seen by its coordinator.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Participant {
    pub assignment_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub kind: String,
    pub task_status: TaskStatus,
}
