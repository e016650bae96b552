mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub(crate) mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::admin_routes())
        .merge(handlers::coordinator_routes())
        .merge(handlers::volunteer_routes())
        .merge(handlers::beneficiary_routes())
}
