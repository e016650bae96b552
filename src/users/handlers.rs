use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest, UserFilter},
    services,
};
use crate::{
    auth::{
        dto::PublicUser,
        extractors::AdminUser,
        handlers::USER_NOT_FOUND,
        password::hash_password,
        repo_types::{NewUser, User, UserChanges},
        services::{check_password, checked_email, required_text},
    },
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<UserFilter>,
) -> AppResult<Json<Vec<PublicUser>>> {
    let users = User::list(&state.db, filter.role).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let name = required_text(&payload.name, "name")?;
    let email = checked_email(&payload.email)?;
    check_password(&payload.password)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::conflict("El email ya está registrado"));
    }

    let hash = hash_password(&payload.password).await?;
    let user = User::create(
        &state.db,
        NewUser {
            name: &name,
            email: &email,
            password_hash: &hash,
            role: payload.role,
            description: payload.description.as_deref(),
            birth_date: payload.birth_date,
        },
    )
    .await?;
    info!(admin_id = %admin.id, user_id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<PublicUser>> {
    let name = payload
        .name
        .as_deref()
        .map(|n| required_text(n, "name"))
        .transpose()?;
    let email = payload.email.as_deref().map(checked_email).transpose()?;
    let password_hash = match payload.password.as_deref() {
        Some(p) => {
            check_password(p)?;
            Some(hash_password(p).await?)
        }
        None => None,
    };

    if let Some(email) = &email {
        if let Some(other) = User::find_by_email(&state.db, email).await? {
            if other.id != id {
                return Err(AppError::conflict("El email ya está registrado"));
            }
        }
    }
    let changes = UserChanges {
        name,
        email,
        password_hash,
        role: payload.role,
        description: payload.description,
        birth_date: payload.birth_date,
    };
    let user = services::update_user_guarded(&state.db, id, changes).await?;
    info!(admin_id = %admin.id, user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if admin.id == id {
        return Err(AppError::validation("No puedes eliminar tu propia cuenta"));
    }
    services::delete_user_guarded(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
