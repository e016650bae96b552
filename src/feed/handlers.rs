use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{dto::PostMessageRequest, repo_types::Message};
use crate::{
    auth::{extractors::AuthUser, repo_types::Role},
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    pagination::Pagination,
    state::AppState,
};

const MESSAGE_NOT_FOUND: &str = "Mensaje no encontrado";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(list_messages).post(post_message))
        .route("/feed/:id", delete(delete_message))
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Message>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(Message::latest(&state.db, limit, offset).await?))
}

#[instrument(skip(state, payload))]
pub async fn post_message(
    State(state): State<AppState>,
    me: AuthUser,
    Json(payload): Json<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let text = payload.checked()?;
    let message = Message::post(&state.db, me.id, text).await?;
    info!(user_id = %me.id, message_id = %message.id, "feed message posted");
    Ok((StatusCode::CREATED, Json(message)))
}

#[instrument(skip(state))]
pub async fn delete_message(
    State(state): State<AppState>,
    me: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let sender = Message::sender_of(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND))?;
    if sender != me.id && me.role != Role::Admin {
        warn!(user_id = %me.id, message_id = %id, "delete of a foreign feed message");
        return Err(AppError::forbidden("Solo puedes eliminar tus propios mensajes"));
    }
    Message::delete(&state.db, id).await?;
    info!(user_id = %me.id, message_id = %id, "feed message deleted");
    Ok(StatusCode::NO_CONTENT)
}
