use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use skybook_core::{Store, StoreError, StoreTx};
use skybook_shared::{Airport, City, Flight, Order, OrderStatus, Passenger, Plane, Ticket, User};

/// Everything the memory backend holds. Tickets and orders keep
/// insertion order (catalog order matters for price tie-breaks).
#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    passengers: HashMap<Uuid, Passenger>,
    user_passengers: HashSet<(Uuid, Uuid)>,
    planes: HashMap<Uuid, Plane>,
    cities: Vec<City>,
    airports: Vec<Airport>,
    flights: HashMap<Uuid, Flight>,
    tickets: Vec<Ticket>,
    orders: Vec<Order>,
}

/// In-memory store. One mutex guards the whole state: a transaction
/// owns the guard for its lifetime, which trivially linearizes all
/// row-level locking the Postgres backend does per row. Rollback is a
/// snapshot restore.
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    lock_wait: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_wait(Duration::from_millis(5000))
    }

    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_wait,
        }
    }

    async fn lock(&self) -> Result<OwnedMutexGuard<MemoryState>, StoreError> {
        tokio::time::timeout(self.lock_wait, self.state.clone().lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)
    }

    // Seeding -------------------------------------------------------

    pub async fn add_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn add_passenger(&self, passenger: Passenger) {
        self.state
            .lock()
            .await
            .passengers
            .insert(passenger.id, passenger);
    }

    pub async fn link_user_passenger(&self, user_id: Uuid, passenger_id: Uuid) {
        self.state
            .lock()
            .await
            .user_passengers
            .insert((user_id, passenger_id));
    }

    pub async fn add_plane(&self, plane: Plane) {
        self.state.lock().await.planes.insert(plane.id, plane);
    }

    pub async fn add_city(&self, city: City) {
        self.state.lock().await.cities.push(city);
    }

    pub async fn add_airport(&self, airport: Airport) {
        self.state.lock().await.airports.push(airport);
    }

    pub async fn add_flight(&self, flight: Flight) {
        self.state.lock().await.flights.insert(flight.id, flight);
    }

    pub async fn add_ticket(&self, ticket: Ticket) {
        self.state.lock().await.tickets.push(ticket);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
    committed: bool,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        // Dropping without commit rolls back to the snapshot
        if !self.committed {
            if let Some(snapshot) = self.snapshot.take() {
                *self.guard = snapshot;
            }
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = self.lock().await?;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            snapshot: Some(snapshot),
            committed: false,
        }))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().await?.users.get(&id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .await?
            .users
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn get_passenger(&self, id: Uuid) -> Result<Option<Passenger>, StoreError> {
        Ok(self.lock().await?.passengers.get(&id).cloned())
    }

    async fn user_passenger_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .lock()
            .await?
            .user_passengers
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, p)| *p)
            .collect())
    }

    async fn user_owns_passenger(
        &self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .await?
            .user_passengers
            .contains(&(user_id, passenger_id)))
    }

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .lock()
            .await?
            .tickets
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn get_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.lock().await?.flights.get(&id).cloned())
    }

    async fn get_plane(&self, id: Uuid) -> Result<Option<Plane>, StoreError> {
        Ok(self.lock().await?.planes.get(&id).cloned())
    }

    async fn flight_tickets(&self, flight_id: Uuid) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .lock()
            .await?
            .tickets
            .iter()
            .filter(|t| t.flight_id == flight_id)
            .cloned()
            .collect())
    }

    async fn list_cities(&self) -> Result<Vec<City>, StoreError> {
        Ok(self.lock().await?.cities.clone())
    }

    async fn city_airports(&self, city_code: &str) -> Result<Vec<Airport>, StoreError> {
        Ok(self
            .lock()
            .await?
            .airports
            .iter()
            .filter(|a| a.city_code == city_code)
            .cloned()
            .collect())
    }

    async fn flights_between(
        &self,
        departure_airports: &[String],
        arrival_airports: &[String],
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Flight>, StoreError> {
        Ok(self
            .lock()
            .await?
            .flights
            .values()
            .filter(|f| {
                departure_airports.contains(&f.departure_airport)
                    && arrival_airports.contains(&f.arrival_airport)
                    && window
                        .map(|(start, end)| f.departure_time >= start && f.departure_time < end)
                        .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self
            .lock()
            .await?
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn orders_for_passengers(
        &self,
        passenger_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .lock()
            .await?
            .orders
            .iter()
            .filter(|o| {
                passenger_ids.contains(&o.passenger_id)
                    && status.map(|s| o.status == s).unwrap_or(true)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.purchase_time.cmp(&a.purchase_time));
        Ok(orders)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, StoreError> {
        Ok(self.guard.passengers.get(&id).cloned())
    }

    async fn flight_for_update(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.guard.flights.get(&id).cloned())
    }

    async fn order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.guard.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn user_for_update(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.guard.users.get(&id).cloned())
    }

    async fn user_owns_passenger(
        &mut self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.guard.user_passengers.contains(&(user_id, passenger_id)))
    }

    async fn get_ticket(&mut self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        Ok(self.guard.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn get_flight(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        Ok(self.guard.flights.get(&id).cloned())
    }

    async fn get_plane(&mut self, id: Uuid) -> Result<Option<Plane>, StoreError> {
        Ok(self.guard.planes.get(&id).cloned())
    }

    async fn find_confirmed_order(
        &mut self,
        passenger_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .guard
            .orders
            .iter()
            .find(|o| {
                o.passenger_id == passenger_id
                    && o.ticket_id == ticket_id
                    && o.status == OrderStatus::Confirmed
            })
            .cloned())
    }

    async fn update_flight_seats(&mut self, flight: &Flight) -> Result<(), StoreError> {
        let stored = self
            .guard
            .flights
            .get_mut(&flight.id)
            .ok_or_else(|| StoreError::Backend("flight row vanished".to_string()))?;
        stored.remaining_first_class_seats = flight.remaining_first_class_seats;
        stored.remaining_business_seats = flight.remaining_business_seats;
        stored.remaining_economy_seats = flight.remaining_economy_seats;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.guard.orders.push(order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let stored = self
            .guard
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| StoreError::Backend("order row vanished".to_string()))?;
        *stored = order.clone();
        Ok(())
    }

    async fn update_user_loyalty(&mut self, user: &User) -> Result<(), StoreError> {
        let stored = self
            .guard
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::Backend("user row vanished".to_string()))?;
        stored.accumulated_miles = user.accumulated_miles;
        stored.ticket_count = user.ticket_count;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.committed = true;
        Ok(())
    }
}
