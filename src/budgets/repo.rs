use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{Budget, BudgetWrite};

const BUDGET_SELECT: &str = r#"
    SELECT e.id, e.program_id, p.name AS program_name, e.amount, e.description,
           e.date, e.created_at
      FROM e
      JOIN programs p ON p.id = e.program_id
"#;

impl Budget {
    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Budget>> {
        sqlx::query_as::<_, Budget>(&format!(
            "WITH e AS (SELECT * FROM expenses) {BUDGET_SELECT} ORDER BY p.name"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn find(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Option<Budget>> {
        sqlx::query_as::<_, Budget>(&format!(
            "WITH e AS (SELECT * FROM expenses WHERE id = $1) {BUDGET_SELECT}"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, w: &BudgetWrite) -> sqlx::Result<Budget> {
        sqlx::query_as::<_, Budget>(&format!(
            "WITH e AS (INSERT INTO expenses (program_id, amount, description, date) \
                        VALUES ($1, $2, $3, COALESCE($4, CURRENT_DATE)) RETURNING *) \
             {BUDGET_SELECT}"
        ))
        .bind(w.program_id)
        .bind(w.amount)
        .bind(&w.description)
        .bind(w.date)
        .fetch_one(conn)
        .await
    }

    pub async fn update(conn: &mut PgConnection, id: Uuid, w: &BudgetWrite) -> sqlx::Result<Option<Budget>> {
        sqlx::query_as::<_, Budget>(&format!(
            "WITH e AS (UPDATE expenses SET program_id = $2, amount = $3, description = $4, \
                               date = COALESCE($5, date) \
                         WHERE id = $1 RETURNING *) \
             {BUDGET_SELECT}"
        ))
        .bind(id)
        .bind(w.program_id)
        .bind(w.amount)
        .bind(&w.description)
        .bind(w.date)
        .fetch_optional(conn)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}
