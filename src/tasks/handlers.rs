use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo_types::{NewTask, Task, TaskChanges},
};
use crate::{
    auth::{
        extractors::{BeneficiaryUser, CoordinatorUser, VolunteerUser},
        services::required_text,
    },
    error::{AppError, AppResult},
    extract::{Json, Path},
    guard::AssignmentTable,
    programs::services::{coordinator_scope, ensure_managed},
    state::AppState,
};

const TASK_NOT_FOUND: &str = "Tarea no encontrada";

pub fn coordinator_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/coordinator/programs/:id/tasks",
            get(program_tasks).post(create_task),
        )
        .route("/coordinator/tasks/:id", put(update_task).delete(delete_task))
}

pub fn participant_routes() -> Router<AppState> {
    Router::new()
        .route("/volunteer/tasks", get(volunteer_tasks))
        .route("/beneficiary/tasks", get(beneficiary_tasks))
}

#[instrument(skip(state))]
pub async fn program_tasks(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(program_id): Path<Uuid>,
) -> AppResult<Json<Vec<Task>>> {
    ensure_managed(&state.db, program_id, &me).await?;
    Ok(Json(Task::list_for_program(&state.db, program_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(program_id): Path<Uuid>,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let title = required_text(&payload.title, "title")?;
    ensure_managed(&state.db, program_id, &me).await?;

    let task = Task::create(
        &state.db,
        program_id,
        NewTask {
            title,
            description: payload.description,
            end_date: payload.end_date,
            image: payload.image,
            video: payload.video,
        },
    )
    .await?;
    info!(user_id = %me.id, task_id = %task.id, %program_id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    let title = payload
        .title
        .as_deref()
        .map(|t| required_text(t, "title"))
        .transpose()?;
    let changes = TaskChanges {
        title,
        description: payload.description,
        end_date: payload.end_date,
        image: payload.image,
        video: payload.video,
    };
    let task = Task::update(&state.db, id, coordinator_scope(&me), changes)
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;
    info!(user_id = %me.id, task_id = %id, "task updated");
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if Task::delete(&state.db, id, coordinator_scope(&me)).await? == 0 {
        return Err(AppError::not_found(TASK_NOT_FOUND));
    }
    info!(user_id = %me.id, task_id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn volunteer_tasks(
    State(state): State<AppState>,
    VolunteerUser(me): VolunteerUser,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_participant(&state.db, AssignmentTable::Volunteers, me.id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state))]
pub async fn beneficiary_tasks(
    State(state): State<AppState>,
    BeneficiaryUser(me): BeneficiaryUser,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_participant(&state.db, AssignmentTable::Beneficiaries, me.id).await?;
    Ok(Json(tasks))
}
