use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{Budget, BudgetWrite};
use crate::error::{AppError, AppResult};
use crate::guard::{budget_taken, lock_program};
use crate::programs::services::PROGRAM_NOT_FOUND;

pub const BUDGET_NOT_FOUND: &str = "Presupuesto no encontrado";
pub const BUDGET_TAKEN: &str = "El programa ya tiene un presupuesto";

async fn check_write(conn: &mut PgConnection, w: &BudgetWrite, exclude: Option<Uuid>) -> AppResult<()> {
    if lock_program(conn, w.program_id).await?.is_none() {
        return Err(AppError::not_found(PROGRAM_NOT_FOUND));
    }
    if budget_taken(conn, w.program_id, exclude).await? {
        warn!(program_id = %w.program_id, "duplicate budget line");
        return Err(AppError::conflict(BUDGET_TAKEN));
    }
    Ok(())
}

pub async fn create(db: &PgPool, w: BudgetWrite) -> AppResult<Budget> {
    let mut tx = db.begin().await?;
    check_write(&mut tx, &w, None).await?;
    let budget = Budget::insert(&mut tx, &w).await?;
    tx.commit().await?;
    info!(budget_id = %budget.id, program_id = %budget.program_id, "budget created");
    Ok(budget)
}

/// `build` turns the stored line into the write to apply.
pub async fn update<F>(db: &PgPool, id: Uuid, build: F) -> AppResult<Budget>
where
    F: FnOnce(&Budget) -> AppResult<BudgetWrite>,
{
    let mut tx = db.begin().await?;
    let current = Budget::find(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found(BUDGET_NOT_FOUND))?;
    let w = build(&current)?;
    check_write(&mut tx, &w, Some(id)).await?;
    let budget = Budget::update(&mut tx, id, &w)
        .await?
        .ok_or_else(|| AppError::not_found(BUDGET_NOT_FOUND))?;
    tx.commit().await?;
    info!(budget_id = %id, "budget updated");
    Ok(budget)
}
