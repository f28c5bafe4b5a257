use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use skybook_core::BookingError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Booking(BookingError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl From<skybook_core::StoreError> for AppError {
    fn from(err: skybook_core::StoreError) -> Self {
        AppError::Booking(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::Booking(err) => {
                let status = match &err {
                    BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                    BookingError::Forbidden => StatusCode::FORBIDDEN,
                    BookingError::InvalidTransition { .. }
                    | BookingError::TypeMismatch { .. }
                    | BookingError::SeatUnavailable(_)
                    | BookingError::DuplicatePurchase => StatusCode::CONFLICT,
                    BookingError::BadRequest(_) => StatusCode::BAD_REQUEST,
                    BookingError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
                    BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("Internal Server Error: {}", err);
                    "Internal Server Error".to_string()
                } else {
                    err.to_string()
                };
                (status, err.kind(), message)
            }
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
