use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{
    AssignmentWrite, BeneficiaryAssignment, CurrentAssignment, FeedbackEntry, TaskStatus,
    VolunteerAssignment,
};
use crate::guard::AssignmentTable;

const VOLUNTEER_SELECT: &str = r#"
    SELECT v.id, v.user_id, u.name AS user_name, v.program_id, p.name AS program_name,
           p.status AS program_status, v.task_status, v.created_at
      FROM v
      JOIN users u ON u.id = v.user_id
      JOIN programs p ON p.id = v.program_id
"#;

const BENEFICIARY_SELECT: &str = r#"
    SELECT b.id, b.user_id, u.name AS user_name, b.program_id, p.name AS program_name,
           p.status AS program_status, b.task_id, t.title AS task_title, b.task_status,
           b.feedback, b.score, b.created_at
      FROM b
      JOIN users u ON u.id = b.user_id
      JOIN programs p ON p.id = b.program_id
      LEFT JOIN tasks t ON t.id = b.task_id
"#;

// Every query below binds the assignment rows as `v` / `b` through a CTE so
// reads and writes share the joined projection above.

impl VolunteerAssignment {
    pub async fn list(db: &PgPool, program_id: Option<Uuid>) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH v AS (SELECT * FROM volunteers WHERE ($1::uuid IS NULL OR program_id = $1)) \
             {VOLUNTEER_SELECT} ORDER BY p.name, u.name"
        ))
        .bind(program_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH v AS (SELECT * FROM volunteers WHERE user_id = $1) {VOLUNTEER_SELECT} ORDER BY v.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, w: &AssignmentWrite) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH v AS (INSERT INTO volunteers (user_id, program_id, task_status) VALUES ($1, $2, $3) RETURNING *) \
             {VOLUNTEER_SELECT}"
        ))
        .bind(w.user_id)
        .bind(w.program_id)
        .bind(w.task_status)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, id: Uuid, w: &AssignmentWrite) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH v AS (UPDATE volunteers SET user_id = $2, program_id = $3, task_status = $4 \
                        WHERE id = $1 RETURNING *) \
             {VOLUNTEER_SELECT}"
        ))
        .bind(id)
        .bind(w.user_id)
        .bind(w.program_id)
        .bind(w.task_status)
        .fetch_optional(conn)
        .await
    }

    /// Status change of an assignment owned by `user_id`.
    pub async fn set_status(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH v AS (UPDATE volunteers SET task_status = $3 WHERE id = $1 AND user_id = $2 RETURNING *) \
             {VOLUNTEER_SELECT}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await
    }
}

impl BeneficiaryAssignment {
    pub async fn list(db: &PgPool, program_id: Option<Uuid>) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (SELECT * FROM beneficiaries WHERE ($1::uuid IS NULL OR program_id = $1)) \
             {BENEFICIARY_SELECT} ORDER BY p.name, u.name"
        ))
        .bind(program_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (SELECT * FROM beneficiaries WHERE user_id = $1) {BENEFICIARY_SELECT} ORDER BY b.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_for_user(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (SELECT * FROM beneficiaries WHERE id = $1 AND user_id = $2) {BENEFICIARY_SELECT}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, w: &AssignmentWrite) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (INSERT INTO beneficiaries (user_id, program_id, task_id, task_status) \
                        VALUES ($1, $2, $3, $4) RETURNING *) \
             {BENEFICIARY_SELECT}"
        ))
        .bind(w.user_id)
        .bind(w.program_id)
        .bind(w.task_id)
        .bind(w.task_status)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, id: Uuid, w: &AssignmentWrite) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (UPDATE beneficiaries SET user_id = $2, program_id = $3, task_id = $4, task_status = $5 \
                        WHERE id = $1 RETURNING *) \
             {BENEFICIARY_SELECT}"
        ))
        .bind(id)
        .bind(w.user_id)
        .bind(w.program_id)
        .bind(w.task_id)
        .bind(w.task_status)
        .fetch_optional(conn)
        .await
    }

    pub async fn set_status(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (UPDATE beneficiaries SET task_status = $3 WHERE id = $1 AND user_id = $2 RETURNING *) \
             {BENEFICIARY_SELECT}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await
    }

    pub async fn set_feedback(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        feedback: Option<&str>,
        score: i16,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "WITH b AS (UPDATE beneficiaries SET feedback = $3, score = $4 \
                        WHERE id = $1 AND user_id = $2 RETURNING *) \
             {BENEFICIARY_SELECT}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(feedback)
        .bind(score)
        .fetch_optional(db)
        .await
    }
}

pub async fn feedback_for_program(db: &PgPool, program_id: Uuid) -> sqlx::Result<Vec<FeedbackEntry>> {
    sqlx::query_as::<_, FeedbackEntry>(
        r#"
        SELECT b.id AS assignment_id, b.user_id, u.name AS user_name, t.title AS task_title,
               b.feedback, b.score
          FROM beneficiaries b
          JOIN users u ON u.id = b.user_id
          LEFT JOIN tasks t ON t.id = b.task_id
         WHERE b.program_id = $1 AND (b.feedback IS NOT NULL OR b.score IS NOT NULL)
         ORDER BY u.name
        "#,
    )
    .bind(program_id)
    .fetch_all(db)
    .await
}

/// Current values of an assignment row; `None` when it does not exist.
pub async fn current(
    conn: &mut PgConnection,
    table: AssignmentTable,
    id: Uuid,
) -> sqlx::Result<Option<CurrentAssignment>> {
    let task_col = match table {
        AssignmentTable::Volunteers => "NULL::uuid",
        AssignmentTable::Beneficiaries => "task_id",
    };
    let sql = format!(
        "SELECT user_id, program_id, {task_col} AS task_id, task_status FROM {} WHERE id = $1",
        table.table()
    );
    sqlx::query_as::<_, CurrentAssignment>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn task_in_program(conn: &mut PgConnection, task_id: Uuid, program_id: Uuid) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1 AND program_id = $2)")
        .bind(task_id)
        .bind(program_id)
        .fetch_one(conn)
        .await
}

pub async fn delete(db: &PgPool, table: AssignmentTable, id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.table()))
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
