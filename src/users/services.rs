use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo;
use crate::auth::{
    handlers::USER_NOT_FOUND,
    repo_types::{Role, User, UserChanges},
};
use crate::error::{AppError, AppResult};
use crate::guard::{ensure_unreferenced, lock_user, AssignmentTable, Blocker};

/// Deletes a user unless a program, volunteer or beneficiary row still
/// references it. Check and delete share one transaction holding the
/// user row lock.
pub async fn delete_user_guarded(db: &PgPool, user_id: Uuid) -> AppResult<()> {
    let mut tx = db.begin().await?;

    if lock_user(&mut tx, user_id).await?.is_none() {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    let blockers = vec![
        Blocker::new("coordinator", repo::coordinated_program_names(&mut tx, user_id).await?),
        Blocker::new(
            "beneficiary",
            repo::assigned_program_names(&mut tx, AssignmentTable::Beneficiaries, user_id).await?,
        ),
        Blocker::new(
            "volunteer",
            repo::assigned_program_names(&mut tx, AssignmentTable::Volunteers, user_id).await?,
        ),
    ];
    if let Err(e) = ensure_unreferenced("el usuario", blockers) {
        warn!(%user_id, "user delete refused: still referenced");
        return Err(e);
    }

    repo::delete_user(&mut tx, user_id).await?;
    tx.commit().await?;
    info!(%user_id, "user deleted");
    Ok(())
}

/// Applies `changes` to a user. A role change is refused while the user
/// still holds rows the new role could not hold: programs in charge unless
/// the role may coordinate, volunteer or beneficiary assignments unless the
/// role stays the same. Checks and update share one transaction holding the
/// user row lock.
pub async fn update_user_guarded(db: &PgPool, user_id: Uuid, changes: UserChanges) -> AppResult<User> {
    let mut tx = db.begin().await?;

    if lock_user(&mut tx, user_id).await?.is_none() {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }

    if let Some(role) = changes.role {
        let coordinated = if matches!(role, Role::Coordinator | Role::Admin) {
            Vec::new()
        } else {
            repo::coordinated_program_names(&mut tx, user_id).await?
        };
        let volunteering = if role == Role::Volunteer {
            Vec::new()
        } else {
            repo::assigned_program_names(&mut tx, AssignmentTable::Volunteers, user_id).await?
        };
        let beneficiary = if role == Role::Beneficiary {
            Vec::new()
        } else {
            repo::assigned_program_names(&mut tx, AssignmentTable::Beneficiaries, user_id).await?
        };
        if let Some(reason) = role_change_conflict(role, &coordinated, &volunteering, &beneficiary) {
            warn!(%user_id, %role, "role change refused: user still referenced");
            return Err(AppError::validation(reason));
        }
    }

    let user = User::update(&mut *tx, user_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    tx.commit().await?;
    Ok(user)
}

/// Message naming every program that keeps the user from taking `role`.
fn role_change_conflict(
    role: Role,
    coordinated: &[String],
    volunteering: &[String],
    beneficiary: &[String],
) -> Option<String> {
    let mut parts = Vec::new();
    if !coordinated.is_empty() {
        parts.push(format!("coordina {}", coordinated.join(", ")));
    }
    if !volunteering.is_empty() {
        parts.push(format!("es voluntario en {}", volunteering.join(", ")));
    }
    if !beneficiary.is_empty() {
        parts.push(format!("es beneficiario en {}", beneficiary.join(", ")));
    }
    if parts.is_empty() {
        return None;
    }
    Some(format!(
        "No se puede cambiar el rol a {role}: el usuario {}",
        parts.join("; ")
    ))
}
