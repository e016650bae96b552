use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Account role; stored as the Postgres enum `user_role`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Coordinator,
    Volunteer,
    Beneficiary,
    Donor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
            Role::Volunteer => "volunteer",
            Role::Beneficiary => "beneficiary",
            Role::Donor => "donor",
        }
    }

    /// Roles anyone can pick at sign-up; staff accounts are created by an admin.
    pub fn self_registrable(self) -> bool {
        matches!(self, Role::Volunteer | Role::Beneficiary | Role::Donor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column list matching [`User`].
pub const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, description, profile_picture, birth_date, created_at";

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2, never exposed
    pub role: Role,
    pub description: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(with = "crate::iso_date::option")]
    pub birth_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields of a user row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub description: Option<&'a str>,
    pub birth_date: Option<Date>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub description: Option<String>,
    pub birth_date: Option<Date>,
}
