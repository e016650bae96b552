use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::Donation;

const DONATION_SELECT: &str = r#"
    SELECT d.id, d.donor_id, u.name AS donor_name, u.email AS donor_email,
           d.amount, d.date, d.created_at
      FROM d
      LEFT JOIN users u ON u.id = d.donor_id
"#;

impl Donation {
    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Donation>> {
        sqlx::query_as::<_, Donation>(&format!(
            "WITH d AS (SELECT * FROM donations) {DONATION_SELECT} ORDER BY d.date DESC, d.created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn list_for_donor(db: &PgPool, donor_id: Uuid) -> sqlx::Result<Vec<Donation>> {
        sqlx::query_as::<_, Donation>(&format!(
            "WITH d AS (SELECT * FROM donations WHERE donor_id = $1) {DONATION_SELECT} \
             ORDER BY d.date DESC, d.created_at DESC"
        ))
        .bind(donor_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_for_donor(db: &PgPool, id: Uuid, donor_id: Uuid) -> sqlx::Result<Option<Donation>> {
        sqlx::query_as::<_, Donation>(&format!(
            "WITH d AS (SELECT * FROM donations WHERE id = $1 AND donor_id = $2) {DONATION_SELECT}"
        ))
        .bind(id)
        .bind(donor_id)
        .fetch_optional(db)
        .await
    }

    /// Records a donation; a missing `date` is stored as today.
    pub async fn create(db: &PgPool, donor_id: Uuid, amount: f64, date: Option<Date>) -> sqlx::Result<Donation> {
        sqlx::query_as::<_, Donation>(&format!(
            "WITH d AS (INSERT INTO donations (donor_id, amount, date) \
                        VALUES ($1, $2, COALESCE($3, CURRENT_DATE)) RETURNING *) \
             {DONATION_SELECT}"
        ))
        .bind(donor_id)
        .bind(amount)
        .bind(date)
        .fetch_one(db)
        .await
    }
}

pub async fn total_donations(db: &PgPool) -> sqlx::Result<f64> {
    sqlx::query_scalar::<_, f64>("SELECT COALESCE(SUM(amount), 0)::float8 FROM donations")
        .fetch_one(db)
        .await
}
