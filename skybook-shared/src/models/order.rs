use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status in the lifecycle. Pending and Confirmed are live;
/// Canceled and Refunded are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Canceled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "canceled" => Some(OrderStatus::Canceled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Refunded)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase of one ticket for one passenger. `total_price` is a
/// snapshot of the ticket price at purchase time and is never
/// recomputed; `purchase_time` is set once. The refund fields are set
/// only on cancellation from Confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub ticket_id: Uuid,
    pub status: OrderStatus,
    pub total_price: f64,
    pub purchase_time: DateTime<Utc>,
    pub refund_amount: Option<f64>,
    pub refund_time: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(passenger_id: Uuid, ticket_id: Uuid, total_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            passenger_id,
            ticket_id,
            status: OrderStatus::Pending,
            total_price,
            purchase_time: Utc::now(),
            refund_amount: None,
            refund_time: None,
        }
    }
}
