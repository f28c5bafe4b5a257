use serde::Serialize;
use skybook_shared::{Flight, PassengerType, SeatClass, Ticket};
use uuid::Uuid;

use crate::inventory;

/// Cheapest adult-eligible fare for a flight.
#[derive(Debug, Clone, Serialize)]
pub struct MinAdultPrice {
    pub flight_id: Uuid,
    pub min_price: f64,
    pub seat_class: SeatClass,
}

/// Scan the flight's tickets for the cheapest adult fare. Ties break
/// toward the first ticket encountered in catalog order.
pub fn min_adult_price(flight_id: Uuid, tickets: &[Ticket]) -> Option<MinAdultPrice> {
    let mut best: Option<&Ticket> = None;
    for ticket in tickets.iter().filter(|t| t.ticket_type == PassengerType::Adult) {
        match best {
            Some(current) if current.price <= ticket.price => {}
            _ => best = Some(ticket),
        }
    }
    best.map(|t| MinAdultPrice {
        flight_id,
        min_price: t.price,
        seat_class: t.seat_class,
    })
}

/// A catalog ticket joined with the live seat count for its class.
#[derive(Debug, Clone, Serialize)]
pub struct TicketAvailability {
    pub ticket_id: Uuid,
    pub ticket_type: PassengerType,
    pub seat_class: SeatClass,
    pub price: f64,
    pub baggage_allowance_kg: f64,
    pub remaining_seats: i32,
}

pub fn with_availability(ticket: &Ticket, flight: &Flight) -> TicketAvailability {
    TicketAvailability {
        ticket_id: ticket.id,
        ticket_type: ticket.ticket_type,
        seat_class: ticket.seat_class,
        price: ticket.price,
        baggage_allowance_kg: ticket.baggage_allowance_kg,
        remaining_seats: inventory::remaining(flight, ticket.seat_class),
    }
}
