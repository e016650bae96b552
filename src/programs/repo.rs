use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{NewProgram, Participant, Program, ProgramChanges, ProgramStatus};

const PROGRAM_COLUMNS: &str = "p.id, p.name, p.description, p.start_date, p.end_date, p.objectives, \
     p.coordinator_charge, u.name AS coordinator_name, p.image, p.status, p.created_at";

impl Program {
    pub async fn list(db: &PgPool, status: Option<ProgramStatus>) -> sqlx::Result<Vec<Program>> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
              FROM programs p
              JOIN users u ON u.id = p.coordinator_charge
             WHERE ($1::program_status IS NULL OR p.status = $1)
             ORDER BY p.start_date DESC, p.name
            "#
        ))
        .bind(status)
        .fetch_all(db)
        .await
    }

    pub async fn list_by_coordinator(db: &PgPool, coordinator_id: Uuid) -> sqlx::Result<Vec<Program>> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
              FROM programs p
              JOIN users u ON u.id = p.coordinator_charge
             WHERE p.coordinator_charge = $1
             ORDER BY p.start_date DESC, p.name
            "#
        ))
        .bind(coordinator_id)
        .fetch_all(db)
        .await
    }

    pub async fn find(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Program>> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
              FROM programs p
              JOIN users u ON u.id = p.coordinator_charge
             WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(db: &PgPool, new: NewProgram) -> sqlx::Result<Program> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            WITH p AS (
                INSERT INTO programs (name, description, start_date, end_date, objectives, coordinator_charge, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {PROGRAM_COLUMNS} FROM p JOIN users u ON u.id = p.coordinator_charge
            "#
        ))
        .bind(new.name)
        .bind(new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.objectives)
        .bind(new.coordinator_charge)
        .bind(new.status)
        .fetch_one(db)
        .await
    }

    /// Applies `changes`; with `coordinator` set, only a program in that
    /// user's charge is touched.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        coordinator: Option<Uuid>,
        changes: ProgramChanges,
    ) -> sqlx::Result<Option<Program>> {
        sqlx::query_as::<_, Program>(&format!(
            r#"
            WITH p AS (
                UPDATE programs
                   SET name               = COALESCE($3, name),
                       description        = COALESCE($4, description),
                       start_date         = COALESCE($5, start_date),
                       end_date           = COALESCE($6, end_date),
                       objectives         = COALESCE($7, objectives),
                       coordinator_charge = COALESCE($8, coordinator_charge),
                       status             = COALESCE($9, status)
                 WHERE id = $1 AND ($2::uuid IS NULL OR coordinator_charge = $2)
                RETURNING *
            )
            SELECT {PROGRAM_COLUMNS} FROM p JOIN users u ON u.id = p.coordinator_charge
            "#
        ))
        .bind(id)
        .bind(coordinator)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.objectives)
        .bind(changes.coordinator_charge)
        .bind(changes.status)
        .fetch_optional(db)
        .await
    }

    /// Store a new image path, returning the previous one.
    pub async fn set_image(db: &PgPool, id: Uuid, path: &str) -> sqlx::Result<Option<Option<String>>> {
        sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE programs p
               SET image = $2
              FROM (SELECT id, image FROM programs WHERE id = $1 FOR UPDATE) old
             WHERE p.id = old.id
            RETURNING old.image
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(db)
        .await
    }

    /// (volunteers, beneficiaries) assigned to the program.
    pub async fn participant_counts(db: &PgPool, id: Uuid) -> sqlx::Result<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT (SELECT COUNT(*) FROM volunteers WHERE program_id = $1),
                   (SELECT COUNT(*) FROM beneficiaries WHERE program_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await
    }

    pub async fn participants(db: &PgPool, id: Uuid) -> sqlx::Result<Vec<Participant>> {
        sqlx::query_as::<_, Participant>(
            r#"
            SELECT v.id AS assignment_id, u.id AS user_id, u.name, u.email,
                   'volunteer'::text AS kind, v.task_status
              FROM volunteers v JOIN users u ON u.id = v.user_id
             WHERE v.program_id = $1
            UNION ALL
            SELECT b.id, u.id, u.name, u.email, 'beneficiary'::text, b.task_status
              FROM beneficiaries b JOIN users u ON u.id = b.user_id
             WHERE b.program_id = $1
             ORDER BY kind, name
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await
    }
}

/// Whether `program_id` exists and, when `coordinator` is set, is in their charge.
pub async fn is_managed_by(db: &PgPool, program_id: Uuid, coordinator: Option<Uuid>) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM programs WHERE id = $1 AND ($2::uuid IS NULL OR coordinator_charge = $2))",
    )
    .bind(program_id)
    .bind(coordinator)
    .fetch_one(db)
    .await
}

/// Names of the users holding a row of `table` in the program.
pub async fn assigned_user_names(
    conn: &mut PgConnection,
    table: crate::guard::AssignmentTable,
    program_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    let sql = format!(
        "SELECT u.name FROM {} a JOIN users u ON u.id = a.user_id WHERE a.program_id = $1 ORDER BY u.name",
        table.table()
    );
    sqlx::query_scalar(&sql).bind(program_id).fetch_all(conn).await
}

pub async fn delete_program(conn: &mut PgConnection, program_id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM programs WHERE id = $1")
        .bind(program_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
