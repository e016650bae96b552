use sqlx::PgConnection;
use uuid::Uuid;

/// Names of the programs `user_id` is in charge of.
pub async fn coordinated_program_names(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar("SELECT name FROM programs WHERE coordinator_charge = $1 ORDER BY name")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

/// Names of the programs where `user_id` holds a row in `table`
/// (`volunteers` or `beneficiaries`).
pub async fn assigned_program_names(
    conn: &mut PgConnection,
    table: crate::guard::AssignmentTable,
    user_id: Uuid,
) -> sqlx::Result<Vec<String>> {
    let sql = format!(
        "SELECT p.name FROM {} a JOIN programs p ON p.id = a.program_id WHERE a.user_id = $1 ORDER BY p.name",
        table.table()
    );
    sqlx::query_scalar(&sql).bind(user_id).fetch_all(conn).await
}

pub async fn delete_user(conn: &mut PgConnection, user_id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
