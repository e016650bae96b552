use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{BudgetSummary, CreateBudgetRequest, UpdateBudgetRequest},
    repo_types::Budget,
    services::{self, BUDGET_NOT_FOUND},
};
use crate::{
    auth::extractors::AdminUser,
    donations::repo::total_donations,
    error::{AppError, AppResult},
    extract::{Json, Path},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/budgets", get(list_budgets).post(create_budget))
        .route("/admin/budgets/summary", get(summary))
        .route(
            "/admin/budgets/:id",
            put(update_budget).delete(delete_budget),
        )
}

#[instrument(skip(state))]
pub async fn list_budgets(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<Budget>>> {
    Ok(Json(Budget::list(&state.db).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_budget(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateBudgetRequest>,
) -> AppResult<(StatusCode, Json<Budget>)> {
    let write = payload.into_write()?;
    let budget = services::create(&state.db, write).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

#[instrument(skip(state, payload))]
pub async fn update_budget(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBudgetRequest>,
) -> AppResult<Json<Budget>> {
    let budget = services::update(&state.db, id, |current| payload.merge(current)).await?;
    Ok(Json(budget))
}

#[instrument(skip(state))]
pub async fn delete_budget(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if Budget::delete(&state.db, id).await? == 0 {
        return Err(AppError::not_found(BUDGET_NOT_FOUND));
    }
    info!(admin_id = %admin.id, budget_id = %id, "budget deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<BudgetSummary>> {
    let total = total_donations(&state.db).await?;
    let budgets = Budget::list(&state.db).await?;
    Ok(Json(BudgetSummary::new(total, budgets)))
}
