use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eligibility tag matched against a ticket's `ticket_type`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    Adult,
    Student,
    Teacher,
    Senior,
}

impl PassengerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Student => "student",
            PassengerType::Teacher => "teacher",
            PassengerType::Senior => "senior",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "adult" => Some(PassengerType::Adult),
            "student" => Some(PassengerType::Student),
            "teacher" => Some(PassengerType::Teacher),
            "senior" => Some(PassengerType::Senior),
            _ => None,
        }
    }
}

impl std::fmt::Display for PassengerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A traveler. Owned by zero or more users through the
/// user-passenger relation (managed passengers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub person_type: PassengerType,
    pub phone_number: String,
    pub email: Option<String>,
}

/// Account holder. `accumulated_miles` and `ticket_count` are mutated
/// only by the loyalty ledger on order confirmation/refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub accumulated_miles: f64,
    pub ticket_count: i32,
}
