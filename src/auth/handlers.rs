use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, Role, User, UserChanges},
        services::{check_password, checked_email, generate_reset_token, normalize_email, required_text},
    },
    error::{AppError, AppResult},
    extract::Json,
    mail::{password_reset_email, reset_link},
    state::AppState,
    uploads::{self, MAX_UPLOAD_BYTES},
};

pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
pub const WRONG_PASSWORD: &str = "Contraseña incorrecta";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route(
            "/me/picture",
            post(upload_picture).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    let keys = JwtKeys::from_ref(state);
    keys.sign(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = required_text(&payload.name, "name")?;
    let email = checked_email(&payload.email)?;
    check_password(&payload.password)?;

    let role = payload.role.unwrap_or(Role::Volunteer);
    if !role.self_registrable() {
        warn!(%role, "self-registration with staff role");
        return Err(AppError::validation("Rol no permitido en el registro"));
    }

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
            role,
            description: payload.description.as_deref(),
            birth_date: payload.birth_date,
        },
    )
    .await?;

    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Email y contraseña son obligatorios"));
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login unknown email");
            return Err(AppError::validation(USER_NOT_FOUND));
        }
    };

    if !verify_password(&payload.password, &user.password_hash).await? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::validation(WRONG_PASSWORD));
    }

    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    me: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, me.id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    me: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    let name = payload
        .name
        .as_deref()
        .map(|n| required_text(n, "name"))
        .transpose()?;
    let changes = UserChanges {
        name,
        description: payload.description,
        birth_date: payload.birth_date,
        ..Default::default()
    };
    let user = User::update(&state.db, me.id, changes)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, mp))]
pub async fn upload_picture(
    State(state): State<AppState>,
    me: AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<PublicUser>> {
    let item = uploads::read_image_field(&mut mp, "picture").await?;
    let path = uploads::store_image(&state, &format!("users/{}", me.id), item).await?;

    let previous = match User::set_profile_picture(&state.db, me.id, &path).await? {
        Some(previous) => previous,
        None => {
            uploads::discard(&state, Some(path)).await;
            return Err(AppError::not_found(USER_NOT_FOUND));
        }
    };
    uploads::discard(&state, previous).await;

    let user = User::find_by_id(&state.db, me.id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    info!(user_id = %user.id, "profile picture updated");
    Ok(Json(user.into()))
}

/// Always answers 200 so the endpoint does not reveal which emails exist.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = checked_email(&payload.email)?;
    let done = MessageResponse::new(
        "Si el email está registrado, recibirás un enlace para restablecer tu contraseña",
    );

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "password reset for unknown email");
        return Ok(Json(done));
    };

    let mail_cfg = &state.config.mail;
    let token = generate_reset_token();
    let expires = OffsetDateTime::now_utc() + TimeDuration::minutes(mail_cfg.reset_ttl_minutes);
    User::set_reset_token(&state.db, user.id, &token, expires).await?;

    let link = reset_link(&mail_cfg.frontend_url, &token);
    let (subject, html) = password_reset_email(&user.name, &link, mail_cfg.reset_ttl_minutes);
    // The caller gets the same answer whether or not the relay accepted the mail.
    match state.mailer.send_html(&user.email, &subject, html).await {
        Ok(()) => info!(user_id = %user.id, "password reset mail sent"),
        Err(e) => error!(error = %e, user_id = %user.id, "reset mail failed"),
    }
    Ok(Json(done))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(AppError::validation("Token inválido o expirado"));
    }
    check_password(&payload.password)?;

    let hash = hash_password(&payload.password).await?;
    match User::consume_reset_token(&state.db, token, &hash).await? {
        Some(user_id) => {
            info!(%user_id, "password reset");
            Ok(Json(MessageResponse::new("Contraseña actualizada")))
        }
        None => {
            warn!("reset with unknown or expired token");
            Err(AppError::validation("Token inválido o expirado"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_response_serialization() {
        let response = MessageResponse::new("ok");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"message":"ok"}"#);
    }
}
