use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use skybook_shared::{Airport, City, Flight, Order, OrderStatus, Passenger, Plane, Ticket, User};

/// Read-side storage access plus the entry point for transactions.
///
/// Everything contended (seat counters, order rows, loyalty counters)
/// goes through [`StoreTx`]; the methods here are plain reads with no
/// locking requirements.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a transaction. Implementations must guarantee that
    /// everything done through the returned handle is all-or-nothing:
    /// dropping the handle without `commit` rolls every write back.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Identity resolution: authenticated caller name to internal user.
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;

    async fn get_passenger(&self, id: Uuid) -> Result<Option<Passenger>, StoreError>;

    /// Ids of the passengers managed by this user.
    async fn user_passenger_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Ownership check used by the Forbidden guard.
    async fn user_owns_passenger(
        &self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    async fn get_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError>;

    async fn get_plane(&self, id: Uuid) -> Result<Option<Plane>, StoreError>;

    /// All catalog tickets for a flight, in catalog order.
    async fn flight_tickets(&self, flight_id: Uuid) -> Result<Vec<Ticket>, StoreError>;

    async fn list_cities(&self) -> Result<Vec<City>, StoreError>;

    async fn city_airports(&self, city_code: &str) -> Result<Vec<Airport>, StoreError>;

    /// Flights departing from any of `departure_airports` and arriving
    /// at any of `arrival_airports`, optionally restricted to a
    /// half-open departure window.
    async fn flights_between(
        &self,
        departure_airports: &[String],
        arrival_airports: &[String],
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Flight>, StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Orders belonging to any of the given passengers, newest first.
    async fn orders_for_passengers(
        &self,
        passenger_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError>;
}

/// One storage transaction. The `*_for_update` methods take the
/// row-level exclusive lock for the returned entity; the lock is held
/// until `commit` or drop. Lock acquisition is bounded and fails with
/// [`StoreError::LockTimeout`] when contended past the configured wait.
#[async_trait]
pub trait StoreTx: Send + std::fmt::Debug {
    async fn passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, StoreError>;

    async fn flight_for_update(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError>;

    async fn order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn user_for_update(&mut self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Ownership check evaluated inside this transaction, used by the
    /// Forbidden guard on confirm/cancel.
    async fn user_owns_passenger(
        &mut self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn get_ticket(&mut self, id: Uuid) -> Result<Option<Ticket>, StoreError>;

    async fn get_flight(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError>;

    async fn get_plane(&mut self, id: Uuid) -> Result<Option<Plane>, StoreError>;

    /// Existing Confirmed order for the same (passenger, ticket), the
    /// duplicate-purchase guard.
    async fn find_confirmed_order(
        &mut self,
        passenger_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Option<Order>, StoreError>;

    /// Persist the seat counters of a flight row previously taken with
    /// `flight_for_update`.
    async fn update_flight_seats(&mut self, flight: &Flight) -> Result<(), StoreError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError>;

    /// Persist the loyalty counters of a user row previously taken with
    /// `user_for_update`.
    async fn update_user_loyalty(&mut self, user: &User) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
