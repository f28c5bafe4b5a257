use chrono::{DateTime, Utc};
use skybook_core::{BookingError, BookingResult};
use skybook_shared::{Flight, Order, OrderStatus};

/// Refund share of the purchase price on cancellation from Confirmed.
/// Fixed by policy; computed exactly once at cancellation time.
pub const REFUND_RATE: f64 = 0.8;

/// What a successful cancellation did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Pending order withdrawn; no money had moved, no refund fields set.
    Canceled,
    /// Confirmed order refunded at [`REFUND_RATE`]; loyalty must be
    /// reversed by the caller.
    Refunded,
}

/// A cancellation is allowed while the order is still live (Pending or
/// Confirmed) and the flight has not yet departed. The departure check
/// applies to both live states.
pub fn can_cancel(order: &Order, flight: &Flight, now: DateTime<Utc>) -> bool {
    matches!(order.status, OrderStatus::Pending | OrderStatus::Confirmed)
        && !flight.has_departed(now)
}

/// Transition: Pending -> Confirmed. Seat inventory is untouched here;
/// the seat was already taken when the order was created.
pub fn confirm(order: &mut Order) -> BookingResult<()> {
    if order.status != OrderStatus::Pending {
        return Err(BookingError::InvalidTransition {
            from: order.status.to_string(),
            to: OrderStatus::Confirmed.to_string(),
        });
    }
    order.status = OrderStatus::Confirmed;
    Ok(())
}

/// Transition: Pending -> Canceled, or Confirmed -> Refunded. Only the
/// Confirmed path sets the refund fields.
pub fn cancel(order: &mut Order, flight: &Flight, now: DateTime<Utc>) -> BookingResult<CancelOutcome> {
    if !can_cancel(order, flight, now) {
        // Confirmed orders cancel into Refunded, everything else into
        // Canceled; the error names the state actually being targeted.
        let to = match order.status {
            OrderStatus::Confirmed => OrderStatus::Refunded,
            _ => OrderStatus::Canceled,
        };
        return Err(BookingError::InvalidTransition {
            from: order.status.to_string(),
            to: to.to_string(),
        });
    }

    match order.status {
        OrderStatus::Pending => {
            order.status = OrderStatus::Canceled;
            Ok(CancelOutcome::Canceled)
        }
        OrderStatus::Confirmed => {
            order.status = OrderStatus::Refunded;
            order.refund_amount = Some(order.total_price * REFUND_RATE);
            order.refund_time = Some(now);
            Ok(CancelOutcome::Refunded)
        }
        // can_cancel already rejected the terminal states
        OrderStatus::Canceled | OrderStatus::Refunded => unreachable!(),
    }
}
