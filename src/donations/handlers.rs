use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateDonationRequest, Receipt},
    repo_types::Donation,
};
use crate::{
    auth::extractors::{AdminUser, DonorUser},
    error::{AppError, AppResult},
    extract::{Json, Path},
    state::AppState,
};

const DONATION_NOT_FOUND: &str = "Donación no encontrada";

pub fn donor_routes() -> Router<AppState> {
    Router::new()
        .route("/donor/donations", get(my_donations).post(donate))
        .route("/donor/donations/:id/receipt", get(receipt))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/donations", get(list_donations))
}

#[instrument(skip(state))]
pub async fn my_donations(
    State(state): State<AppState>,
    DonorUser(me): DonorUser,
) -> AppResult<Json<Vec<Donation>>> {
    Ok(Json(Donation::list_for_donor(&state.db, me.id).await?))
}

#[instrument(skip(state))]
pub async fn donate(
    State(state): State<AppState>,
    DonorUser(me): DonorUser,
    Json(payload): Json<CreateDonationRequest>,
) -> AppResult<(StatusCode, Json<Donation>)> {
    let amount = payload.checked_amount()?;
    let donation = Donation::create(&state.db, me.id, amount, payload.date).await?;
    info!(donor_id = %me.id, donation_id = %donation.id, amount, "donation recorded");
    Ok((StatusCode::CREATED, Json(donation)))
}

#[instrument(skip(state))]
pub async fn receipt(
    State(state): State<AppState>,
    DonorUser(me): DonorUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Receipt>> {
    let donation = Donation::find_for_donor(&state.db, id, me.id)
        .await?
        .ok_or_else(|| AppError::not_found(DONATION_NOT_FOUND))?;
    Ok(Json(Receipt::for_donation(donation, OffsetDateTime::now_utc())))
}

#[instrument(skip(state))]
pub async fn list_donations(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<Donation>>> {
    Ok(Json(Donation::list(&state.db).await?))
}
