use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        CoordinatorProgramUpdate, CreateProgramRequest, ParticipantsResponse, ProgramDetails,
        ProgramFilter, UpdateProgramRequest,
    },
    repo_types::{NewProgram, Program, ProgramChanges, ProgramStatus},
    services::{self, PROGRAM_NOT_FOUND},
};
use crate::{
    auth::{
        extractors::{AdminUser, CoordinatorUser},
        services::required_text,
    },
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    state::AppState,
    uploads::{self, MAX_UPLOAD_BYTES},
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/programs", get(list_active_programs))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/programs", get(list_programs).post(create_program))
        .route(
            "/admin/programs/:id",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route(
            "/admin/programs/:id/image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

pub fn coordinator_routes() -> Router<AppState> {
    Router::new()
        .route("/coordinator/programs", get(my_programs))
        .route("/coordinator/programs/:id", put(update_my_program))
        .route("/coordinator/programs/:id/participants", get(participants))
}

#[instrument(skip(state))]
pub async fn list_active_programs(State(state): State<AppState>) -> AppResult<Json<Vec<Program>>> {
    Ok(Json(Program::list(&state.db, Some(ProgramStatus::Active)).await?))
}

#[instrument(skip(state))]
pub async fn list_programs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<ProgramFilter>,
) -> AppResult<Json<Vec<Program>>> {
    Ok(Json(Program::list(&state.db, filter.status).await?))
}

#[instrument(skip(state))]
pub async fn get_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProgramDetails>> {
    let program = Program::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(PROGRAM_NOT_FOUND))?;
    let (volunteers, beneficiaries) = Program::participant_counts(&state.db, id).await?;
    Ok(Json(ProgramDetails {
        program,
        volunteers,
        beneficiaries,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_program(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateProgramRequest>,
) -> AppResult<(StatusCode, Json<Program>)> {
    let name = required_text(&payload.name, "name")?;
    services::check_dates(Some(payload.start_date), payload.end_date)?;
    services::ensure_coordinator(&state.db, payload.coordinator_charge).await?;

    let program = Program::create(
        &state.db,
        NewProgram {
            name,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
            objectives: payload.objectives,
            coordinator_charge: payload.coordinator_charge,
            status: payload.status.unwrap_or(ProgramStatus::Active),
        },
    )
    .await?;
    info!(admin_id = %admin.id, program_id = %program.id, "program created");
    Ok((StatusCode::CREATED, Json(program)))
}

#[instrument(skip(state, payload))]
pub async fn update_program(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProgramRequest>,
) -> AppResult<Json<Program>> {
    let name = payload
        .name
        .as_deref()
        .map(|n| required_text(n, "name"))
        .transpose()?;
    services::check_dates(payload.start_date, payload.end_date)?;
    if let Some(coordinator) = payload.coordinator_charge {
        services::ensure_coordinator(&state.db, coordinator).await?;
    }

    let changes = ProgramChanges {
        name,
        description: payload.description,
        start_date: payload.start_date,
        end_date: payload.end_date,
        objectives: payload.objectives,
        coordinator_charge: payload.coordinator_charge,
        status: payload.status,
    };
    let program = Program::update(&state.db, id, None, changes)
        .await?
        .ok_or_else(|| AppError::not_found(PROGRAM_NOT_FOUND))?;
    info!(admin_id = %admin.id, program_id = %program.id, "program updated");
    Ok(Json(program))
}

#[instrument(skip(state))]
pub async fn delete_program(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let image = services::delete_program_guarded(&state.db, id).await?;
    uploads::discard(&state, image).await;
    info!(admin_id = %admin.id, program_id = %id, "program removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> AppResult<Json<Program>> {
    let item = uploads::read_image_field(&mut mp, "image").await?;
    let path = uploads::store_image(&state, &format!("programs/{}", id), item).await?;

    let previous = match Program::set_image(&state.db, id, &path).await? {
        Some(previous) => previous,
        None => {
            uploads::discard(&state, Some(path)).await;
            return Err(AppError::not_found(PROGRAM_NOT_FOUND));
        }
    };
    uploads::discard(&state, previous).await;

    let program = Program::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(PROGRAM_NOT_FOUND))?;
    Ok(Json(program))
}

#[instrument(skip(state))]
pub async fn my_programs(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
) -> AppResult<Json<Vec<Program>>> {
    Ok(Json(Program::list_by_coordinator(&state.db, me.id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_my_program(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CoordinatorProgramUpdate>,
) -> AppResult<Json<Program>> {
    let changes = ProgramChanges {
        description: payload.description,
        objectives: payload.objectives,
        status: payload.status,
        ..Default::default()
    };
    let program = Program::update(&state.db, id, services::coordinator_scope(&me), changes)
        .await?
        .ok_or_else(|| AppError::not_found(PROGRAM_NOT_FOUND))?;
    info!(user_id = %me.id, program_id = %program.id, "program updated by coordinator");
    Ok(Json(program))
}

#[instrument(skip(state))]
pub async fn participants(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ParticipantsResponse>> {
    services::ensure_managed(&state.db, id, &me).await?;
    let (volunteers, beneficiaries): (Vec<_>, Vec<_>) = Program::participants(&state.db, id)
        .await?
        .into_iter()
        .partition(|p| p.kind == "volunteer");
    Ok(Json(ParticipantsResponse {
        program_id: id,
        volunteers,
        beneficiaries,
    }))
}
