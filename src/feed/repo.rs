use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Message;

impl Message {
    pub async fn latest(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT c.id, c.sender_id, u.name AS sender_name, c.message, c.sent_at
              FROM communications c
              JOIN users u ON u.id = c.sender_id
             ORDER BY c.sent_at DESC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn post(db: &PgPool, sender_id: Uuid, message: &str) -> sqlx::Result<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            WITH c AS (
                INSERT INTO communications (sender_id, message) VALUES ($1, $2) RETURNING *
            )
            SELECT c.id, c.sender_id, u.name AS sender_name, c.message, c.sent_at
              FROM c JOIN users u ON u.id = c.sender_id
            "#,
        )
        .bind(sender_id)
        .bind(message)
        .fetch_one(db)
        .await
    }

    pub async fn sender_of(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT sender_id FROM communications WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM communications WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}
