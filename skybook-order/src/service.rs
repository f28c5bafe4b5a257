use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use skybook_catalog::tickets::{MinAdultPrice, TicketAvailability};
use skybook_catalog::{inventory, search, tickets};
use skybook_core::{BookingError, BookingResult, Store};
use skybook_shared::{City, Flight, Order, OrderStatus, Passenger, PassengerType, Ticket};

use crate::{loyalty, machine};

/// Orchestrates the seat inventory, order state machine and loyalty
/// ledger over one storage backend. All mutations of an order and its
/// flight's seat counters happen inside a single store transaction.
pub struct BookingService {
    store: Arc<dyn Store>,
}

/// Flight line in search results.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub remaining_first_class_seats: i32,
    pub remaining_business_seats: i32,
    pub remaining_economy_seats: i32,
    pub plane_model: String,
}

/// Order line in a user's order list, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub passenger_id: Uuid,
    pub ticket_id: Uuid,
    pub status: OrderStatus,
    pub total_price: f64,
    pub purchase_time: DateTime<Utc>,
}

/// Full order view with its ticket and flight.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub passenger: Passenger,
    pub ticket: Ticket,
    pub flight: Flight,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Purchase a ticket for a passenger: reserve the seat and create a
    /// Pending order in one transaction. The passenger row lock guards
    /// against duplicate-purchase races, the flight row lock serializes
    /// the seat decrement.
    pub async fn purchase(&self, passenger_id: Uuid, ticket_id: Uuid) -> BookingResult<Order> {
        let mut tx = self.store.begin().await?;

        let passenger = tx
            .passenger_for_update(passenger_id)
            .await?
            .ok_or(BookingError::NotFound("passenger"))?;
        let ticket = tx
            .get_ticket(ticket_id)
            .await?
            .ok_or(BookingError::NotFound("ticket"))?;

        if tx
            .find_confirmed_order(passenger.id, ticket.id)
            .await?
            .is_some()
        {
            return Err(BookingError::DuplicatePurchase);
        }

        // Adult fares accept every passenger type; class-restricted
        // fares must match exactly.
        if ticket.ticket_type != PassengerType::Adult
            && passenger.person_type != ticket.ticket_type
        {
            return Err(BookingError::TypeMismatch {
                passenger: passenger.person_type,
                ticket: ticket.ticket_type,
            });
        }

        let mut flight = tx
            .flight_for_update(ticket.flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;

        inventory::reserve(&mut flight, ticket.seat_class)
            .map_err(|_| BookingError::SeatUnavailable(ticket.seat_class))?;
        tx.update_flight_seats(&flight).await?;

        let order = Order::new(passenger.id, ticket.id, ticket.price);
        tx.insert_order(&order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, passenger_id = %passenger.id, ticket_id = %ticket.id, "order created");
        Ok(order)
    }

    /// Confirm a Pending order and credit the caller's loyalty ledger.
    /// Seats are not re-checked: they were decremented at purchase.
    pub async fn confirm_order(&self, order_id: Uuid, caller_id: Uuid) -> BookingResult<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .order_for_update(order_id)
            .await?
            .ok_or(BookingError::NotFound("order"))?;

        if !tx.user_owns_passenger(caller_id, order.passenger_id).await? {
            return Err(BookingError::Forbidden);
        }

        machine::confirm(&mut order)?;
        tx.update_order(&order).await?;

        let ticket = tx
            .get_ticket(order.ticket_id)
            .await?
            .ok_or(BookingError::NotFound("ticket"))?;
        let flight = tx
            .get_flight(ticket.flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;

        let mut user = tx
            .user_for_update(caller_id)
            .await?
            .ok_or(BookingError::NotFound("user"))?;
        loyalty::credit(&mut user, flight.distance);
        tx.update_user_loyalty(&user).await?;

        tx.commit().await?;

        info!(order_id = %order.id, user_id = %caller_id, miles = flight.distance, "order confirmed");
        Ok(order)
    }

    /// Cancel a live order: Pending -> Canceled, Confirmed -> Refunded
    /// (80% of the purchase price, loyalty reversed). Either way the
    /// seat goes back to the flight, all in one transaction under the
    /// flight row lock.
    pub async fn cancel_order(&self, order_id: Uuid, caller_id: Uuid) -> BookingResult<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .order_for_update(order_id)
            .await?
            .ok_or(BookingError::NotFound("order"))?;

        if !tx.user_owns_passenger(caller_id, order.passenger_id).await? {
            return Err(BookingError::Forbidden);
        }

        let ticket = tx
            .get_ticket(order.ticket_id)
            .await?
            .ok_or(BookingError::NotFound("ticket"))?;
        let mut flight = tx
            .flight_for_update(ticket.flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;

        let outcome = machine::cancel(&mut order, &flight, Utc::now())?;

        if outcome == machine::CancelOutcome::Refunded {
            let mut user = tx
                .user_for_update(caller_id)
                .await?
                .ok_or(BookingError::NotFound("user"))?;
            loyalty::debit(&mut user, flight.distance);
            tx.update_user_loyalty(&user).await?;
        }

        let plane = tx
            .get_plane(flight.plane_id)
            .await?
            .ok_or(BookingError::NotFound("plane"))?;
        inventory::release(&mut flight, ticket.seat_class, &plane)
            .map_err(|e| BookingError::Storage(e.to_string()))?;
        tx.update_flight_seats(&flight).await?;
        tx.update_order(&order).await?;

        tx.commit().await?;

        info!(order_id = %order.id, outcome = ?outcome, "order canceled");
        Ok(order)
    }

    /// The caller's orders across all managed passengers, optionally
    /// filtered by status, newest first.
    pub async fn list_orders(
        &self,
        caller_id: Uuid,
        status: Option<OrderStatus>,
    ) -> BookingResult<Vec<OrderSummary>> {
        let passenger_ids = self.store.user_passenger_ids(caller_id).await?;
        let orders = self
            .store
            .orders_for_passengers(&passenger_ids, status)
            .await?;
        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                order_id: o.id,
                passenger_id: o.passenger_id,
                ticket_id: o.ticket_id,
                status: o.status,
                total_price: o.total_price,
                purchase_time: o.purchase_time,
            })
            .collect())
    }

    pub async fn order_detail(&self, order_id: Uuid, caller_id: Uuid) -> BookingResult<OrderDetail> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(BookingError::NotFound("order"))?;

        if !self
            .store
            .user_owns_passenger(caller_id, order.passenger_id)
            .await?
        {
            return Err(BookingError::Forbidden);
        }

        let passenger = self
            .store
            .get_passenger(order.passenger_id)
            .await?
            .ok_or(BookingError::NotFound("passenger"))?;
        let ticket = self
            .store
            .get_ticket(order.ticket_id)
            .await?
            .ok_or(BookingError::NotFound("ticket"))?;
        let flight = self
            .store
            .get_flight(ticket.flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;

        Ok(OrderDetail {
            order,
            passenger,
            ticket,
            flight,
        })
    }

    /// All tickets of a flight with live remaining-seat counts.
    pub async fn flight_tickets(&self, flight_id: Uuid) -> BookingResult<Vec<TicketAvailability>> {
        let flight = self
            .store
            .get_flight(flight_id)
            .await?
            .ok_or(BookingError::NotFound("flight"))?;
        let catalog = self.store.flight_tickets(flight_id).await?;
        if catalog.is_empty() {
            return Err(BookingError::NotFound("tickets"));
        }
        Ok(catalog
            .iter()
            .map(|t| tickets::with_availability(t, &flight))
            .collect())
    }

    pub async fn min_adult_price(&self, flight_id: Uuid) -> BookingResult<MinAdultPrice> {
        let catalog = self.store.flight_tickets(flight_id).await?;
        tickets::min_adult_price(flight_id, &catalog)
            .ok_or(BookingError::NotFound("adult tickets"))
    }

    /// Search flights between two cities, optionally on one
    /// departure day (half-open [day, next day) window).
    pub async fn search_flights(
        &self,
        departure_city_code: Option<&str>,
        arrival_city_code: Option<&str>,
        departure_date: Option<&str>,
    ) -> BookingResult<Vec<FlightSummary>> {
        let (dep_code, arr_code) = match (departure_city_code, arrival_city_code) {
            (Some(d), Some(a)) if !d.is_empty() && !a.is_empty() => (d, a),
            _ => {
                return Err(BookingError::BadRequest(
                    "Please provide both departure and arrival city codes.".to_string(),
                ))
            }
        };

        let window = match departure_date {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    BookingError::BadRequest(
                        "Invalid date format. Please use YYYY-MM-DD.".to_string(),
                    )
                })?;
                Some(search::day_window(date))
            }
            None => None,
        };

        let departure_airports = self.store.city_airports(dep_code).await?;
        let arrival_airports = self.store.city_airports(arr_code).await?;
        if departure_airports.is_empty() || arrival_airports.is_empty() {
            return Err(BookingError::NotFound("airports"));
        }

        let airport_names: HashMap<String, String> = departure_airports
            .iter()
            .chain(arrival_airports.iter())
            .map(|a| (a.airport_code.clone(), a.airport_name.clone()))
            .collect();

        let dep_codes: Vec<String> = departure_airports
            .iter()
            .map(|a| a.airport_code.clone())
            .collect();
        let arr_codes: Vec<String> = arrival_airports
            .iter()
            .map(|a| a.airport_code.clone())
            .collect();

        let flights = self
            .store
            .flights_between(&dep_codes, &arr_codes, window)
            .await?;
        if flights.is_empty() {
            return Err(BookingError::NotFound("flights"));
        }

        let mut summaries = Vec::with_capacity(flights.len());
        for flight in flights {
            let plane = self
                .store
                .get_plane(flight.plane_id)
                .await?
                .ok_or(BookingError::NotFound("plane"))?;
            let name = |code: &str| {
                airport_names
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| code.to_string())
            };
            summaries.push(FlightSummary {
                flight_id: flight.id,
                flight_number: flight.flight_number.clone(),
                departure_time: flight.departure_time,
                arrival_time: flight.arrival_time,
                departure_airport: name(&flight.departure_airport),
                arrival_airport: name(&flight.arrival_airport),
                remaining_first_class_seats: flight.remaining_first_class_seats,
                remaining_business_seats: flight.remaining_business_seats,
                remaining_economy_seats: flight.remaining_economy_seats,
                plane_model: plane.model,
            });
        }
        Ok(summaries)
    }

    /// City picker: optional case-insensitive substring query over name
    /// or phonetic key, ordered by phonetic key.
    pub async fn search_cities(&self, query: Option<&str>) -> BookingResult<Vec<City>> {
        let cities = self.store.list_cities().await?;
        Ok(search::search_cities(cities, query))
    }

    /// The caller's managed passengers.
    pub async fn list_passengers(&self, caller_id: Uuid) -> BookingResult<Vec<Passenger>> {
        let ids = self.store.user_passenger_ids(caller_id).await?;
        let mut passengers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(p) = self.store.get_passenger(id).await? {
                passengers.push(p);
            }
        }
        Ok(passengers)
    }
}
