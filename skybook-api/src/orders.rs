use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;
use skybook_core::BookingError;
use skybook_order::{OrderDetail, OrderSummary};
use skybook_shared::{Order, OrderStatus};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub passenger_id: Uuid,
    pub ticket_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub passenger_id: Uuid,
    pub ticket_id: Uuid,
    pub status: OrderStatus,
    pub total_price: f64,
    pub purchase_time: DateTime<Utc>,
    pub refund_amount: Option<f64>,
    pub refund_time: Option<DateTime<Utc>>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            passenger_id: order.passenger_id,
            ticket_id: order.ticket_id,
            status: order.status,
            total_price: order.total_price,
            purchase_time: order.purchase_time,
            refund_amount: order.refund_amount,
            refund_time: order.refund_time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(purchase).get(list_orders))
        .route("/v1/orders/{id}", get(order_detail))
        .route("/v1/orders/{id}/confirm", post(confirm_order))
        .route("/v1/orders/{id}/cancel", post(cancel_order))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Purchase a ticket for a passenger; creates a pending order and
/// takes the seat.
async fn purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state.service.purchase(req.passenger_id, req.ticket_id).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// POST /v1/orders/:id/confirm
async fn confirm_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.service.confirm_order(order_id, user.id).await?;
    Ok(Json(order.into()))
}

/// POST /v1/orders/:id/cancel
/// Cancels a pending order or refunds a confirmed one.
async fn cancel_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.service.cancel_order(order_id, user.id).await?;
    Ok(Json(order.into()))
}

/// GET /v1/orders?status=
/// The caller's orders across all managed passengers, newest first.
async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(OrderStatus::parse(raw).ok_or_else(|| {
            BookingError::BadRequest(format!("Unknown order status '{}'.", raw))
        })?),
        None => None,
    };
    let orders = state.service.list_orders(user.id, status).await?;
    Ok(Json(orders))
}

/// GET /v1/orders/:id
async fn order_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let detail = state.service.order_detail(order_id, user.id).await?;
    Ok(Json(detail))
}
