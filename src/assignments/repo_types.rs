use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::programs::repo_types::ProgramStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

pub const MAX_SCORE: i16 = 5;

/// Volunteer assignment joined with user and program names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VolunteerAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub program_id: Uuid,
    pub program_name: String,
    pub program_status: ProgramStatus,
    pub task_status: TaskStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Beneficiary assignment joined with user, program and task.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BeneficiaryAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub program_id: Uuid,
    pub program_name: String,
    pub program_status: ProgramStatus,
    pub task_id: Option<Uuid>,
    pub task_title: Option<String>,
    pub task_status: TaskStatus,
    pub feedback: Option<String>,
    pub score: Option<i16>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedbackEntry {
    pub assignment_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub task_title: Option<String>,
    pub feedback: Option<String>,
    pub score: Option<i16>,
}

/// Stored values of an assignment row that an edit merges onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct CurrentAssignment {
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub task_id: Option<Uuid>,
    pub task_status: TaskStatus,
}

/// Fields written by create and edit of an assignment.
#[derive(Debug, Clone)]
pub struct AssignmentWrite {
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub task_status: TaskStatus,
    /// Beneficiaries only.
    pub task_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_uses_snake_case() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        let s: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(s, TaskStatus::Completed);
    }
}
