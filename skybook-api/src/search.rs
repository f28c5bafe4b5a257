use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use skybook_catalog::tickets::{MinAdultPrice, TicketAvailability};
use skybook_order::FlightSummary;
use skybook_shared::City;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlightQuery {
    pub departure_city_code: Option<String>,
    pub arrival_city_code: Option<String>,
    pub departure_date: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cities", get(search_cities))
        .route("/v1/flights", get(search_flights))
        .route("/v1/flights/{id}/tickets", get(flight_tickets))
        .route("/v1/flights/{id}/min-price", get(min_adult_price))
}

/// GET /v1/cities?query=
async fn search_cities(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<Vec<City>>, AppError> {
    let cities = state.service.search_cities(query.query.as_deref()).await?;
    Ok(Json(cities))
}

/// GET /v1/flights?departure_city_code=&arrival_city_code=&departure_date=
async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<FlightSummary>>, AppError> {
    let flights = state
        .service
        .search_flights(
            query.departure_city_code.as_deref(),
            query.arrival_city_code.as_deref(),
            query.departure_date.as_deref(),
        )
        .await?;
    Ok(Json(flights))
}

/// GET /v1/flights/:id/tickets
async fn flight_tickets(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<Vec<TicketAvailability>>, AppError> {
    let tickets = state.service.flight_tickets(flight_id).await?;
    Ok(Json(tickets))
}

/// GET /v1/flights/:id/min-price
async fn min_adult_price(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<MinAdultPrice>, AppError> {
    let min = state.service.min_adult_price(flight_id).await?;
    Ok(Json(min))
}
