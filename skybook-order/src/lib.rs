pub mod loyalty;
pub mod machine;
pub mod service;

pub use machine::{CancelOutcome, REFUND_RATE};
pub use service::{BookingService, FlightSummary, OrderDetail, OrderSummary};
