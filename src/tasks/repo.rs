use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewTask, Task, TaskChanges};

const TASK_SELECT: &str = r#"
    SELECT t.id, t.program_id, p.name AS program_name, t.title, t.description,
           t.end_date, t.image, t.video, t.created_at
      FROM t
      JOIN programs p ON p.id = t.program_id
"#;

impl Task {
    pub async fn list_for_program(db: &PgPool, program_id: Uuid) -> sqlx::Result<Vec<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            "WITH t AS (SELECT * FROM tasks WHERE program_id = $1) {TASK_SELECT} \
             ORDER BY t.end_date NULLS LAST, t.title"
        ))
        .bind(program_id)
        .fetch_all(db)
        .await
    }

    /// Tasks of every program in which `user_id` holds a row of `table`.
    pub async fn list_for_participant(
        db: &PgPool,
        table: crate::guard::AssignmentTable,
        user_id: Uuid,
    ) -> sqlx::Result<Vec<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            "WITH t AS (SELECT * FROM tasks WHERE program_id IN \
                        (SELECT program_id FROM {} WHERE user_id = $1)) \
             {TASK_SELECT} ORDER BY p.name, t.end_date NULLS LAST, t.title",
            table.table()
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn create(db: &PgPool, program_id: Uuid, new: NewTask) -> sqlx::Result<Task> {
        sqlx::query_as::<_, Task>(&format!(
            "WITH t AS (INSERT INTO tasks (program_id, title, description, end_date, image, video) \
                        VALUES ($1, $2, $3, $4, $5, $6) RETURNING *) \
             {TASK_SELECT}"
        ))
        .bind(program_id)
        .bind(new.title)
        .bind(new.description)
        .bind(new.end_date)
        .bind(new.image)
        .bind(new.video)
        .fetch_one(db)
        .await
    }

    /// Applies `changes` to a task whose program is in `coordinator`'s
    /// charge (any program when `None`).
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        coordinator: Option<Uuid>,
        changes: TaskChanges,
    ) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            WITH t AS (
                UPDATE tasks
                   SET title       = COALESCE($3, title),
                       description = COALESCE($4, description),
                       end_date    = COALESCE($5, end_date),
                       image       = COALESCE($6, image),
                       video       = COALESCE($7, video)
                 WHERE id = $1
                   AND program_id IN (SELECT id FROM programs
                                       WHERE $2::uuid IS NULL OR coordinator_charge = $2)
                RETURNING *
            )
            {TASK_SELECT}
            "#
        ))
        .bind(id)
        .bind(coordinator)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.end_date)
        .bind(changes.image)
        .bind(changes.video)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid, coordinator: Option<Uuid>) -> sqlx::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM tasks
             WHERE id = $1
               AND program_id IN (SELECT id FROM programs
                                   WHERE $2::uuid IS NULL OR coordinator_charge = $2)
            "#,
        )
        .bind(id)
        .bind(coordinator)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }
}
