//! Referential guards run before writes: the blocker report used to refuse
//! deleting users and programs that are still referenced, and the
//! duplicate checks run before assignment and budget writes.
//!
//! Callers run these inside the same transaction as the write, after
//! locking the parent row, so the check and the write cannot interleave
//! with a concurrent insert.

use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One dependent relation that still references the row being deleted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Blocker {
    pub relation: String,
    pub count: usize,
    /// Display names of the referencing rows (program or participant names).
    pub references: Vec<String>,
}

impl Blocker {
    pub fn new(relation: &str, references: Vec<String>) -> Self {
        Self {
            relation: relation.to_string(),
            count: references.len(),
            references,
        }
    }

    fn describe(&self) -> String {
        let label = match self.relation.as_str() {
            "coordinator" => format!("coordinador de {} programa(s)", self.count),
            "beneficiary" => format!("beneficiario en {} programa(s)", self.count),
            "volunteer" => format!("voluntario en {} programa(s)", self.count),
            "beneficiaries" => format!("{} beneficiario(s) asignado(s)", self.count),
            "volunteers" => format!("{} voluntario(s) asignado(s)", self.count),
            other => format!("{} referencia(s) en {}", self.count, other),
        };
        format!("{} [{}]", label, self.references.join(", "))
    }
}

/// `Ok(())` when nothing references the entity, otherwise the refusal
/// naming every non-empty relation.
pub fn ensure_unreferenced(entity: &str, blockers: Vec<Blocker>) -> AppResult<()> {
    let blockers: Vec<Blocker> = blockers.into_iter().filter(|b| b.count > 0).collect();
    if blockers.is_empty() {
        return Ok(());
    }
    let parts: Vec<String> = blockers.iter().map(Blocker::describe).collect();
    Err(AppError::DeleteBlocked {
        message: format!("No se puede eliminar {}: {}", entity, parts.join("; ")),
        blockers,
    })
}

/// Assignment join tables sharing the (user_id, program_id) uniqueness rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTable {
    Volunteers,
    Beneficiaries,
}

impl AssignmentTable {
    pub fn table(self) -> &'static str {
        match self {
            AssignmentTable::Volunteers => "volunteers",
            AssignmentTable::Beneficiaries => "beneficiaries",
        }
    }
}

/// True when another row of `table` already pairs `user_id` with
/// `program_id`. `exclude` skips the row being edited.
pub async fn pair_taken(
    conn: &mut PgConnection,
    table: AssignmentTable,
    user_id: Uuid,
    program_id: Uuid,
    exclude: Option<Uuid>,
) -> sqlx::Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = $1 AND program_id = $2 AND ($3::uuid IS NULL OR id <> $3)",
        table.table()
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(program_id)
        .bind(exclude)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// True when `program_id` already has a budget line other than `exclude`.
pub async fn budget_taken(
    conn: &mut PgConnection,
    program_id: Uuid,
    exclude: Option<Uuid>,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM expenses WHERE program_id = $1 AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(program_id)
    .bind(exclude)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Locks a program row for the rest of the transaction, returning its name.
pub async fn lock_program(conn: &mut PgConnection, program_id: Uuid) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar("SELECT name FROM programs WHERE id = $1 FOR UPDATE")
        .bind(program_id)
        .fetch_optional(conn)
        .await
}

/// Locks a user row for the rest of the transaction, returning its name.
pub async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar("SELECT name FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
