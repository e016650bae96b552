use sqlx::PgPool;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo;
use crate::auth::{
    extractors::AuthUser,
    repo_types::{Role, User},
};
use crate::error::{AppError, AppResult};
use crate::guard::{ensure_unreferenced, lock_program, AssignmentTable, Blocker};

pub const PROGRAM_NOT_FOUND: &str = "Programa no encontrado";

pub fn check_dates(start: Option<Date>, end: Option<Date>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation(
                "La fecha de fin no puede ser anterior a la de inicio",
            ));
        }
    }
    Ok(())
}

/// The program's `coordinator_charge` must be a coordinator (or an admin).
pub async fn ensure_coordinator(db: &PgPool, user_id: Uuid) -> AppResult<()> {
    match User::role_of(db, user_id).await? {
        Some(Role::Coordinator | Role::Admin) => Ok(()),
        Some(role) => {
            warn!(%user_id, %role, "coordinator_charge with non-coordinator role");
            Err(AppError::validation("El usuario asignado no es coordinador"))
        }
        None => Err(AppError::not_found("Coordinador no encontrado")),
    }
}

/// Programs a caller of the coordinator area may act on: admins see every
/// program, coordinators only their own.
pub fn coordinator_scope(caller: &AuthUser) -> Option<Uuid> {
    match caller.role {
        Role::Admin => None,
        _ => Some(caller.id),
    }
}

/// 404 unless the program exists and is within the caller's scope.
pub async fn ensure_managed(db: &PgPool, program_id: Uuid, caller: &AuthUser) -> AppResult<()> {
    if repo::is_managed_by(db, program_id, coordinator_scope(caller)).await? {
        Ok(())
    } else {
        Err(AppError::not_found(PROGRAM_NOT_FOUND))
    }
}

/// Deletes a program unless volunteers or beneficiaries are still
/// assigned to it. Tasks and budget lines go with the program.
pub async fn delete_program_guarded(db: &PgPool, program_id: Uuid) -> AppResult<Option<String>> {
    let mut tx = db.begin().await?;

    if lock_program(&mut tx, program_id).await?.is_none() {
        return Err(AppError::not_found(PROGRAM_NOT_FOUND));
    }

    let blockers = vec![
        Blocker::new(
            "beneficiaries",
            repo::assigned_user_names(&mut tx, AssignmentTable::Beneficiaries, program_id).await?,
        ),
        Blocker::new(
            "volunteers",
            repo::assigned_user_names(&mut tx, AssignmentTable::Volunteers, program_id).await?,
        ),
    ];
    if let Err(e) = ensure_unreferenced("el programa", blockers) {
        warn!(%program_id, "program delete refused: participants assigned");
        return Err(e);
    }

    let image: Option<String> = sqlx::query_scalar("SELECT image FROM programs WHERE id = $1")
        .bind(program_id)
        .fetch_one(&mut *tx)
        .await?;
    repo::delete_program(&mut tx, program_id).await?;
    tx.commit().await?;
    info!(%program_id, "program deleted");
    Ok(image)
}
