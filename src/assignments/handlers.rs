use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        AssignmentFilter, CreateAssignmentRequest, FeedbackRequest, ProgramFeedback, StatusRequest,
        UpdateAssignmentRequest,
    },
    repo,
    repo_types::{BeneficiaryAssignment, VolunteerAssignment},
    services::{self, ASSIGNMENT_NOT_FOUND},
};
use crate::{
    auth::extractors::{AdminUser, BeneficiaryUser, CoordinatorUser, VolunteerUser},
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    guard::AssignmentTable,
    programs::services::ensure_managed,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/volunteers", get(list_volunteers).post(create_volunteer))
        .route(
            "/admin/volunteers/:id",
            put(update_volunteer).delete(delete_volunteer),
        )
        .route(
            "/admin/beneficiaries",
            get(list_beneficiaries).post(create_beneficiary),
        )
        .route(
            "/admin/beneficiaries/:id",
            put(update_beneficiary).delete(delete_beneficiary),
        )
}

pub fn coordinator_routes() -> Router<AppState> {
    Router::new().route("/coordinator/programs/:id/feedback", get(program_feedback))
}

pub fn volunteer_routes() -> Router<AppState> {
    Router::new()
        .route("/volunteer/assignments", get(my_volunteer_assignments))
        .route("/volunteer/assignments/:id/status", put(set_volunteer_status))
}

pub fn beneficiary_routes() -> Router<AppState> {
    Router::new()
        .route("/beneficiary/assignments", get(my_beneficiary_assignments))
        .route("/beneficiary/assignments/:id", get(my_beneficiary_assignment))
        .route("/beneficiary/assignments/:id/feedback", post(give_feedback))
        .route("/beneficiary/assignments/:id/status", put(set_beneficiary_status))
}

#[instrument(skip(state))]
pub async fn list_volunteers(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<AssignmentFilter>,
) -> AppResult<Json<Vec<VolunteerAssignment>>> {
    Ok(Json(VolunteerAssignment::list(&state.db, filter.program_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_volunteer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateAssignmentRequest>,
) -> AppResult<(StatusCode, Json<VolunteerAssignment>)> {
    let row = services::create_volunteer(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_volunteer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> AppResult<Json<VolunteerAssignment>> {
    Ok(Json(services::update_volunteer(&state.db, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_volunteer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::remove(&state.db, AssignmentTable::Volunteers, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_beneficiaries(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<AssignmentFilter>,
) -> AppResult<Json<Vec<BeneficiaryAssignment>>> {
    Ok(Json(BeneficiaryAssignment::list(&state.db, filter.program_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_beneficiary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateAssignmentRequest>,
) -> AppResult<(StatusCode, Json<BeneficiaryAssignment>)> {
    let row = services::create_beneficiary(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_beneficiary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> AppResult<Json<BeneficiaryAssignment>> {
    Ok(Json(services::update_beneficiary(&state.db, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_beneficiary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::remove(&state.db, AssignmentTable::Beneficiaries, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn program_feedback(
    State(state): State<AppState>,
    CoordinatorUser(me): CoordinatorUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProgramFeedback>> {
    ensure_managed(&state.db, id, &me).await?;
    let entries = repo::feedback_for_program(&state.db, id).await?;
    Ok(Json(ProgramFeedback::new(id, entries)))
}

#[instrument(skip(state))]
pub async fn my_volunteer_assignments(
    State(state): State<AppState>,
    VolunteerUser(me): VolunteerUser,
) -> AppResult<Json<Vec<VolunteerAssignment>>> {
    Ok(Json(VolunteerAssignment::list_for_user(&state.db, me.id).await?))
}

#[instrument(skip(state))]
pub async fn set_volunteer_status(
    State(state): State<AppState>,
    VolunteerUser(me): VolunteerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<VolunteerAssignment>> {
    let row = VolunteerAssignment::set_status(&state.db, id, me.id, payload.task_status)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    info!(user_id = %me.id, assignment_id = %id, "volunteer status changed");
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn my_beneficiary_assignments(
    State(state): State<AppState>,
    BeneficiaryUser(me): BeneficiaryUser,
) -> AppResult<Json<Vec<BeneficiaryAssignment>>> {
    Ok(Json(BeneficiaryAssignment::list_for_user(&state.db, me.id).await?))
}

#[instrument(skip(state))]
pub async fn my_beneficiary_assignment(
    State(state): State<AppState>,
    BeneficiaryUser(me): BeneficiaryUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BeneficiaryAssignment>> {
    let row = BeneficiaryAssignment::find_for_user(&state.db, id, me.id)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    Ok(Json(row))
}

#[instrument(skip(state, payload))]
pub async fn give_feedback(
    State(state): State<AppState>,
    BeneficiaryUser(me): BeneficiaryUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeedbackRequest>,
) -> AppResult<Json<BeneficiaryAssignment>> {
    let (feedback, score) = payload.validated()?;
    let row = BeneficiaryAssignment::set_feedback(&state.db, id, me.id, feedback.as_deref(), score)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    info!(user_id = %me.id, assignment_id = %id, score, "feedback recorded");
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn set_beneficiary_status(
    State(state): State<AppState>,
    BeneficiaryUser(me): BeneficiaryUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<BeneficiaryAssignment>> {
    let row = BeneficiaryAssignment::set_status(&state.db, id, me.id, payload.task_status)
        .await?
        .ok_or_else(|| AppError::not_found(ASSIGNMENT_NOT_FOUND))?;
    info!(user_id = %me.id, assignment_id = %id, "beneficiary status changed");
    Ok(Json(row))
}
