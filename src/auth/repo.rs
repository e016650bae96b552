use crate::auth::repo_types::{NewUser, Role, User, UserChanges, USER_COLUMNS};
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

impl User {
    /// Find a user by (normalized) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Role of `id`, or `None` when no such user exists.
    pub async fn role_of<'e, E: PgExecutor<'e>>(db: E, id: Uuid) -> sqlx::Result<Option<Role>> {
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn list(db: &PgPool, role: Option<Role>) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::user_role IS NULL OR role = $1) ORDER BY created_at DESC"
        ))
        .bind(role)
        .fetch_all(db)
        .await
    }

    /// Insert a user with an already hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, description, birth_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.description)
        .bind(new.birth_date)
        .fetch_one(db)
        .await
    }

    /// Overwrite the provided fields; returns `None` when the user is gone.
    pub async fn update<'e, E: PgExecutor<'e>>(
        db: E,
        id: Uuid,
        changes: UserChanges,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   role          = COALESCE($5, role),
                   description   = COALESCE($6, description),
                   birth_date    = COALESCE($7, birth_date)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.role)
        .bind(changes.description)
        .bind(changes.birth_date)
        .fetch_optional(db)
        .await
    }

    /// Store a new picture path, returning the previous one.
    pub async fn set_profile_picture(
        db: &PgPool,
        id: Uuid,
        path: &str,
    ) -> sqlx::Result<Option<Option<String>>> {
        sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE users u
               SET profile_picture = $2
              FROM (SELECT id, profile_picture FROM users WHERE id = $1 FOR UPDATE) old
             WHERE u.id = old.id
            RETURNING old.profile_picture
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(db)
        .await
    }

    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_token_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Replace the password of the user holding an unexpired reset token and
    /// burn the token. Returns the user id, or `None` for an unknown/expired token.
    pub async fn consume_reset_token(
        db: &PgPool,
        token: &str,
        password_hash: &str,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
               SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL
             WHERE reset_token = $1 AND reset_token_expires > now()
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .fetch_optional(db)
        .await
    }
}
