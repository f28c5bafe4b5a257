use skybook_shared::{PassengerType, SeatClass};

/// Failures raised by the storage layer itself, independent of any
/// business rule.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("timed out waiting for a row lock")]
    LockTimeout,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Caller-visible error taxonomy for the booking core. Every business
/// rule violation maps to exactly one of these kinds; only `Storage`
/// represents an unexpected fault.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("caller is not associated with this order's passenger")]
    Forbidden,

    #[error("invalid order transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("passenger type '{passenger}' does not match ticket type '{ticket}'")]
    TypeMismatch {
        passenger: PassengerType,
        ticket: PassengerType,
    },

    #[error("no available {0} seats for this flight")]
    SeatUnavailable(SeatClass),

    #[error("an active order for this passenger and ticket already exists")]
    DuplicatePurchase,

    #[error("{0}")]
    BadRequest(String),

    #[error("timed out waiting for a row lock")]
    LockTimeout,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl BookingError {
    /// Stable machine-readable kind, carried alongside the message in
    /// API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NotFound(_) => "not_found",
            BookingError::Forbidden => "forbidden",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::TypeMismatch { .. } => "type_mismatch",
            BookingError::SeatUnavailable(_) => "seat_unavailable",
            BookingError::DuplicatePurchase => "duplicate_purchase",
            BookingError::BadRequest(_) => "bad_request",
            BookingError::LockTimeout => "lock_timeout",
            BookingError::Storage(_) => "system_error",
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockTimeout => BookingError::LockTimeout,
            StoreError::Backend(msg) => BookingError::Storage(msg),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
