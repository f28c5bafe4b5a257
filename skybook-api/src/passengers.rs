use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;
use skybook_shared::Passenger;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/passengers", get(list_passengers))
}

/// GET /v1/passengers — the caller's managed passengers.
async fn list_passengers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Passenger>>, AppError> {
    let passengers = state.service.list_passengers(user.id).await?;
    Ok(Json(passengers))
}
