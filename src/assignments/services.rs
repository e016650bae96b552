use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateAssignmentRequest, UpdateAssignmentRequest},
    repo,
    repo_types::{
        AssignmentWrite, BeneficiaryAssignment, CurrentAssignment, TaskStatus, VolunteerAssignment,
    },
};
use crate::auth::{
    handlers::USER_NOT_FOUND,
    repo_types::{Role, User},
};
use crate::error::{AppError, AppResult};
use crate::guard::{lock_program, pair_taken, AssignmentTable};
use crate::programs::services::PROGRAM_NOT_FOUND;

pub const ASSIGNMENT_NOT_FOUND: &str = "Asignación no encontrada";
pub const ALREADY_ASSIGNED: &str = "El usuario ya está asignado a este programa";

fn expected_role(table: AssignmentTable) -> Role {
    match table {
        AssignmentTable::Volunteers => Role::Volunteer,
        AssignmentTable::Beneficiaries => Role::Beneficiary,
    }
}

/// Merges an edit request onto the row's current values.
pub fn merge_update(current: CurrentAssignment, req: UpdateAssignmentRequest) -> AssignmentWrite {
    let program_id_next = req.program_id.unwrap_or(current.program_id);
    // A task of the old program cannot follow the assignment to a new one.
    let task_id = match req.task_id {
        Some(t) => Some(t),
        None if program_id_next != current.program_id => None,
        None => current.task_id,
    };
    AssignmentWrite {
        user_id: req.user_id.unwrap_or(current.user_id),
        program_id: program_id_next,
        task_status: req.task_status.unwrap_or(current.task_status),
        task_id,
    }
}

/// Checks run with the program row locked, ahead of the insert or update.
/// `exclude` is the row being edited.
async fn check_write(
    conn: &mut PgConnection,
    table: AssignmentTable,
    w: &AssignmentWrite,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    if lock_program(conn, w.program_id).await?.is_none() {
        return Err(AppError::not_found(PROGRAM_NOT_FOUND));
    }

    let expected = expected_role(table);
    match User::role_of(&mut *conn, w.user_id).await? {
        None => return Err(AppError::not_found(USER_NOT_FOUND)),
        Some(role) if role != expected => {
            warn!(user_id = %w.user_id, %role, %expected, "assignment with wrong role");
            return Err(AppError::validation(format!(
                "El usuario no tiene el rol {}",
                expected
            )));
        }
        Some(_) => {}
    }

    if let Some(task_id) = w.task_id {
        if !repo::task_in_program(conn, task_id, w.program_id).await? {
            return Err(AppError::validation(
                "La tarea no pertenece al programa indicado",
            ));
        }
    }

    if pair_taken(conn, table, w.user_id, w.program_id, exclude).await? {
        warn!(user_id = %w.user_id, program_id = %w.program_id, table = table.table(), "duplicate assignment");
        return Err(AppError::conflict(ALREADY_ASSIGNED));
    }
    Ok(())
}

fn new_write(table: AssignmentTable, req: CreateAssignmentRequest) -> AssignmentWrite {
    AssignmentWrite {
        user_id: req.user_id,
        program_id: req.program_id,
        task_status: req.task_status.unwrap_or(TaskStatus::Pending),
        task_id: match table {
            AssignmentTable::Volunteers => None,
            AssignmentTable::Beneficiaries => req.task_id,
        },
    }
}

pub async fn create_volunteer(db: &PgPool, req: CreateAssignmentRequest) -> AppResult<VolunteerAssignment> {
    let table = AssignmentTable::Volunteers;
    let w = new_write(table, req);
    let mut tx = db.begin().await?;
    check_write(&mut tx, table, &w, None).await?;
    let row = VolunteerAssignment::insert(&mut tx, &w).await?;
    tx.commit().await?;
    info!(assignment_id = %row.id, user_id = %row.user_id, program_id = %row.program_id, "volunteer assigned");
    Ok(row)
}

pub async fn create_beneficiary(db: &PgPool, req: CreateAssignmentRequest) -> AppResult<BeneficiaryAssignment> {
    let table = AssignmentTable::Beneficiaries;
    let w = new_write(table, req);
    let mut tx = db.begin().await?;
    check_write(&mut tx, table, &w, None).await?;
    let row = BeneficiaryAssignment::insert(&mut tx, &w).await?;
    tx.commit().await?;
    info!(assignment_id = %row.id, user_id = %row.user_id, program_id = %row.program_id, "beneficiary assigned");
    Ok(row)
}

/// Loads the row to edit and merges the request onto it. The read happens
/// before any lock is taken so the program lock stays the first one held.
async fn prepare_update(
    conn: &mut PgConnection,
    table: AssignmentTable,
    id: Uuid,
    req: UpdateAssignmentRequest,
) -> AppResult<AssignmentWrite> {
    let current = repo::current(conn, table, id)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    let mut w = merge_update(current, req);
    if table == AssignmentTable::Volunteers {
        w.task_id = None;
    }
    Ok(w)
}

pub async fn update_volunteer(
    db: &PgPool,
    id: Uuid,
    req: UpdateAssignmentRequest,
) -> AppResult<VolunteerAssignment> {
    let table = AssignmentTable::Volunteers;
    let mut tx = db.begin().await?;
    let w = prepare_update(&mut tx, table, id, req).await?;
    check_write(&mut tx, table, &w, Some(id)).await?;
    let row = VolunteerAssignment::update(&mut tx, id, &w)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    tx.commit().await?;
    info!(assignment_id = %id, "volunteer assignment updated");
    Ok(row)
}

pub async fn update_beneficiary(
    db: &PgPool,
    id: Uuid,
    req: UpdateAssignmentRequest,
) -> AppResult<BeneficiaryAssignment> {
    let table = AssignmentTable::Beneficiaries;
    let mut tx = db.begin().await?;
    let w = prepare_update(&mut tx, table, id, req).await?;
    check_write(&mut tx, table, &w, Some(id)).await?;
    let row = BeneficiaryAssignment::update(&mut tx, id, &w)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    tx.commit().await?;
    info!(assignment_id = %id, "beneficiary assignment updated");
    Ok(row)
}

pub async fn remove(db: &PgPool, table: AssignmentTable, id: Uuid) -> AppResult<()> {
    if repo::delete(db, table, id).await? == 0 {
        return Err(AppError::not_found(ASSIGNMENT_NOT_FOUND));
    }
    info!(assignment_id = %id, table = table.table(), "assignment removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(task_status: TaskStatus) -> CurrentAssignment {
        CurrentAssignment {
            user_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            task_id: Some(Uuid::new_v4()),
            task_status,
        }
    }

    #[test]
    fn status_only_edit_keeps_the_pair() {
        let current = stored(TaskStatus::Pending);
        let w = merge_update(
            current,
            UpdateAssignmentRequest {
                user_id: None,
                program_id: None,
                task_status: Some(TaskStatus::Completed),
                task_id: None,
            },
        );
        assert_eq!(
            (w.user_id, w.program_id, w.task_id),
            (current.user_id, current.program_id, current.task_id)
        );
        assert_eq!(w.task_status, TaskStatus::Completed);
    }

    #[test]
    fn moving_program_drops_the_old_task() {
        let current = stored(TaskStatus::InProgress);
        let program = Uuid::new_v4();
        let w = merge_update(
            current,
            UpdateAssignmentRequest {
                user_id: None,
                program_id: Some(program),
                task_status: None,
                task_id: None,
            },
        );
        assert_eq!(w.program_id, program);
        assert_eq!(w.task_id, None);
        assert_eq!(w.task_status, TaskStatus::InProgress);
    }

    #[test]
    fn volunteers_never_carry_a_task() {
        let req = CreateAssignmentRequest {
            user_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            task_status: None,
            task_id: Some(Uuid::new_v4()),
        };
        let w = new_write(AssignmentTable::Volunteers, req);
        assert_eq!(w.task_id, None);
        assert_eq!(w.task_status, TaskStatus::Pending);
    }

    #[test]
    fn role_follows_the_table() {
        assert_eq!(expected_role(AssignmentTable::Volunteers), Role::Volunteer);
        assert_eq!(expected_role(AssignmentTable::Beneficiaries), Role::Beneficiary);
    }
}
