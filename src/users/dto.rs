use serde::Deserialize;
use time::Date;

use crate::auth::repo_types::Role;

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
}

/// Admin-created account; any role allowed.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub birth_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub birth_date: Option<Date>,
}
