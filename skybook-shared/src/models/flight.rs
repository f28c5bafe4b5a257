use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cabin class of a seat/ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeatClass {
    Economy,
    Business,
    FirstClass,
}

impl SeatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Economy => "economy",
            SeatClass::Business => "business",
            SeatClass::FirstClass => "first_class",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "economy" => Some(SeatClass::Economy),
            "business" => Some(SeatClass::Business),
            "first_class" => Some(SeatClass::FirstClass),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aircraft definition; capacities are the upper bounds for the
/// per-flight remaining-seat counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plane {
    pub id: Uuid,
    pub model: String,
    pub first_class_seats: i32,
    pub business_seats: i32,
    pub economy_seats: i32,
}

impl Plane {
    pub fn capacity(&self, class: SeatClass) -> i32 {
        match class {
            SeatClass::Economy => self.economy_seats,
            SeatClass::Business => self.business_seats,
            SeatClass::FirstClass => self.first_class_seats,
        }
    }
}

/// City in the route network. `phonetic_key` is a transliteration-derived
/// sort key supplied at ingest, used for search and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub city_code: String,
    pub city_name: String,
    pub province: String,
    pub phonetic_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub airport_code: String,
    pub iata_code: String,
    pub airport_name: String,
    pub city_code: String,
}

/// A scheduled flight with live seat counters. The three counters are
/// mutated only inside a store transaction holding this row's lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub remaining_first_class_seats: i32,
    pub remaining_business_seats: i32,
    pub remaining_economy_seats: i32,
    pub distance: f64,
    pub plane_id: Uuid,
}

impl Flight {
    pub fn seats_remaining(&self, class: SeatClass) -> i32 {
        match class {
            SeatClass::Economy => self.remaining_economy_seats,
            SeatClass::Business => self.remaining_business_seats,
            SeatClass::FirstClass => self.remaining_first_class_seats,
        }
    }

    pub fn seats_remaining_mut(&mut self, class: SeatClass) -> &mut i32 {
        match class {
            SeatClass::Economy => &mut self.remaining_economy_seats,
            SeatClass::Business => &mut self.remaining_business_seats,
            SeatClass::FirstClass => &mut self.remaining_first_class_seats,
        }
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time <= now
    }
}

/// Catalog ticket definition; immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub seat_class: SeatClass,
    pub ticket_type: super::account::PassengerType,
    pub price: f64,
    pub baggage_allowance_kg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_class_round_trip() {
        for class in [SeatClass::Economy, SeatClass::Business, SeatClass::FirstClass] {
            assert_eq!(SeatClass::parse(class.as_str()), Some(class));
        }
        assert_eq!(SeatClass::parse("premium"), None);
    }

    #[test]
    fn test_seat_class_serde_uses_snake_case() {
        let json = serde_json::to_string(&SeatClass::FirstClass).unwrap();
        assert_eq!(json, "\"first_class\"");
    }
}
