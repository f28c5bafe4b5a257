use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use skybook_core::{Store, StoreError, StoreTx};
use skybook_shared::{
    Airport, City, Flight, Order, OrderStatus, Passenger, PassengerType, Plane, SeatClass, Ticket,
    User,
};

/// Postgres-backed store. Row-level locking uses `SELECT ... FOR
/// UPDATE`; the bounded lock wait is enforced with a transaction-local
/// `lock_timeout`, surfacing as [`StoreError::LockTimeout`].
pub struct PgStore {
    pool: PgPool,
    lock_wait_ms: u64,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        lock_wait_ms: u64,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;
        Ok(Self { pool, lock_wait_ms })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

// Postgres raises 55P03 (lock_not_available) when lock_timeout expires
fn map_err(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("55P03") {
            return StoreError::LockTimeout;
        }
    }
    StoreError::Backend(err.to_string())
}

fn parse_field<T>(parsed: Option<T>, field: &str, raw: &str) -> Result<T, StoreError> {
    parsed.ok_or_else(|| StoreError::Backend(format!("bad {} value in row: {}", field, raw)))
}

// Row structs for type-safe querying

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    accumulated_miles: f64,
    ticket_count: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            accumulated_miles: row.accumulated_miles,
            ticket_count: row.ticket_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    name: String,
    person_type: String,
    phone_number: String,
    email: Option<String>,
}

impl PassengerRow {
    fn into_model(self) -> Result<Passenger, StoreError> {
        let person_type = parse_field(
            PassengerType::parse(&self.person_type),
            "person_type",
            &self.person_type,
        )?;
        Ok(Passenger {
            id: self.id,
            name: self.name,
            person_type,
            phone_number: self.phone_number,
            email: self.email,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PlaneRow {
    id: Uuid,
    model: String,
    first_class_seats: i32,
    business_seats: i32,
    economy_seats: i32,
}

impl From<PlaneRow> for Plane {
    fn from(row: PlaneRow) -> Self {
        Plane {
            id: row.id,
            model: row.model,
            first_class_seats: row.first_class_seats,
            business_seats: row.business_seats,
            economy_seats: row.economy_seats,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    city_code: String,
    city_name: String,
    province: String,
    phonetic_key: String,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        City {
            city_code: row.city_code,
            city_name: row.city_name,
            province: row.province,
            phonetic_key: row.phonetic_key,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    airport_code: String,
    iata_code: String,
    airport_name: String,
    city_code: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            airport_code: row.airport_code,
            iata_code: row.iata_code,
            airport_name: row.airport_name,
            city_code: row.city_code,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    flight_number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    departure_airport: String,
    arrival_airport: String,
    remaining_first_class_seats: i32,
    remaining_business_seats: i32,
    remaining_economy_seats: i32,
    distance: f64,
    plane_id: Uuid,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            flight_number: row.flight_number,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            remaining_first_class_seats: row.remaining_first_class_seats,
            remaining_business_seats: row.remaining_business_seats,
            remaining_economy_seats: row.remaining_economy_seats,
            distance: row.distance,
            plane_id: row.plane_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    flight_id: Uuid,
    seat_class: String,
    ticket_type: String,
    price: f64,
    baggage_allowance_kg: f64,
}

impl TicketRow {
    fn into_model(self) -> Result<Ticket, StoreError> {
        let seat_class = parse_field(
            SeatClass::parse(&self.seat_class),
            "seat_class",
            &self.seat_class,
        )?;
        let ticket_type = parse_field(
            PassengerType::parse(&self.ticket_type),
            "ticket_type",
            &self.ticket_type,
        )?;
        Ok(Ticket {
            id: self.id,
            flight_id: self.flight_id,
            seat_class,
            ticket_type,
            price: self.price,
            baggage_allowance_kg: self.baggage_allowance_kg,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    passenger_id: Uuid,
    ticket_id: Uuid,
    status: String,
    total_price: f64,
    purchase_time: DateTime<Utc>,
    refund_amount: Option<f64>,
    refund_time: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_model(self) -> Result<Order, StoreError> {
        let status = parse_field(OrderStatus::parse(&self.status), "status", &self.status)?;
        Ok(Order {
            id: self.id,
            passenger_id: self.passenger_id,
            ticket_id: self.ticket_id,
            status,
            total_price: self.total_price,
            purchase_time: self.purchase_time,
            refund_amount: self.refund_amount,
            refund_time: self.refund_time,
        })
    }
}

const TICKET_COLS: &str = "id, flight_id, seat_class, ticket_type, price, baggage_allowance_kg";
const FLIGHT_COLS: &str = "id, flight_number, departure_time, arrival_time, departure_airport, \
                           arrival_airport, remaining_first_class_seats, remaining_business_seats, \
                           remaining_economy_seats, distance, plane_id";
const ORDER_COLS: &str = "id, passenger_id, ticket_id, status, total_price, purchase_time, \
                          refund_amount, refund_time";

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        // Transaction-local bound on row-lock waits
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_wait_ms))
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, accumulated_miles, ticket_count FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, accumulated_miles, ticket_count FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(User::from))
    }

    async fn get_passenger(&self, id: Uuid) -> Result<Option<Passenger>, StoreError> {
        let row = sqlx::query_as::<_, PassengerRow>(
            "SELECT id, name, person_type, phone_number, email FROM passengers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(PassengerRow::into_model).transpose()
    }

    async fn user_passenger_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids: Vec<(Uuid,)> =
            sqlx::query_as("SELECT passenger_id FROM user_passengers WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn user_owns_passenger(
        &self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError> {
        let found: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM user_passengers WHERE user_id = $1 AND passenger_id = $2",
        )
        .bind(user_id)
        .bind(passenger_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(found.is_some())
    }

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(TicketRow::into_model).transpose()
    }

    async fn get_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1",
            FLIGHT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(Flight::from))
    }

    async fn get_plane(&self, id: Uuid) -> Result<Option<Plane>, StoreError> {
        let row = sqlx::query_as::<_, PlaneRow>(
            "SELECT id, model, first_class_seats, business_seats, economy_seats \
             FROM planes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(Plane::from))
    }

    async fn flight_tickets(&self, flight_id: Uuid) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE flight_id = $1 ORDER BY catalog_seq",
            TICKET_COLS
        ))
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows.into_iter().map(TicketRow::into_model).collect()
    }

    async fn list_cities(&self) -> Result<Vec<City>, StoreError> {
        let rows = sqlx::query_as::<_, CityRow>(
            "SELECT city_code, city_name, province, phonetic_key FROM cities",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn city_airports(&self, city_code: &str) -> Result<Vec<Airport>, StoreError> {
        let rows = sqlx::query_as::<_, AirportRow>(
            "SELECT airport_code, iata_code, airport_name, city_code \
             FROM airports WHERE city_code = $1",
        )
        .bind(city_code)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Airport::from).collect())
    }

    async fn flights_between(
        &self,
        departure_airports: &[String],
        arrival_airports: &[String],
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Flight>, StoreError> {
        let rows = match window {
            Some((start, end)) => {
                sqlx::query_as::<_, FlightRow>(&format!(
                    "SELECT {} FROM flights \
                     WHERE departure_airport = ANY($1) AND arrival_airport = ANY($2) \
                       AND departure_time >= $3 AND departure_time < $4 \
                     ORDER BY departure_time",
                    FLIGHT_COLS
                ))
                .bind(departure_airports)
                .bind(arrival_airports)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FlightRow>(&format!(
                    "SELECT {} FROM flights \
                     WHERE departure_airport = ANY($1) AND arrival_airport = ANY($2) \
                     ORDER BY departure_time",
                    FLIGHT_COLS
                ))
                .bind(departure_airports)
                .bind(arrival_airports)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn orders_for_passengers(
        &self,
        passenger_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {} FROM orders \
                     WHERE passenger_id = ANY($1) AND status = $2 \
                     ORDER BY purchase_time DESC",
                    ORDER_COLS
                ))
                .bind(passenger_ids)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {} FROM orders WHERE passenger_id = ANY($1) \
                     ORDER BY purchase_time DESC",
                    ORDER_COLS
                ))
                .bind(passenger_ids)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(OrderRow::into_model).collect()
    }
}

#[derive(Debug)]
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn passenger_for_update(&mut self, id: Uuid) -> Result<Option<Passenger>, StoreError> {
        let row = sqlx::query_as::<_, PassengerRow>(
            "SELECT id, name, person_type, phone_number, email \
             FROM passengers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.map(PassengerRow::into_model).transpose()
    }

    async fn flight_for_update(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1 FOR UPDATE",
            FLIGHT_COLS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(row.map(Flight::from))
    }

    async fn order_for_update(&mut self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
            ORDER_COLS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn user_for_update(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, accumulated_miles, ticket_count \
             FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(row.map(User::from))
    }

    async fn user_owns_passenger(
        &mut self,
        user_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<bool, StoreError> {
        let found: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM user_passengers WHERE user_id = $1 AND passenger_id = $2",
        )
        .bind(user_id)
        .bind(passenger_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(found.is_some())
    }

    async fn get_ticket(&mut self, id: Uuid) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.map(TicketRow::into_model).transpose()
    }

    async fn get_flight(&mut self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let row = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE id = $1",
            FLIGHT_COLS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(row.map(Flight::from))
    }

    async fn get_plane(&mut self, id: Uuid) -> Result<Option<Plane>, StoreError> {
        let row = sqlx::query_as::<_, PlaneRow>(
            "SELECT id, model, first_class_seats, business_seats, economy_seats \
             FROM planes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(row.map(Plane::from))
    }

    async fn find_confirmed_order(
        &mut self,
        passenger_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders \
             WHERE passenger_id = $1 AND ticket_id = $2 AND status = 'confirmed' \
             LIMIT 1",
            ORDER_COLS
        ))
        .bind(passenger_id)
        .bind(ticket_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_err)?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn update_flight_seats(&mut self, flight: &Flight) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE flights SET remaining_first_class_seats = $1, \
             remaining_business_seats = $2, remaining_economy_seats = $3 WHERE id = $4",
        )
        .bind(flight.remaining_first_class_seats)
        .bind(flight.remaining_business_seats)
        .bind(flight.remaining_economy_seats)
        .bind(flight.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, passenger_id, ticket_id, status, total_price, \
             purchase_time, refund_amount, refund_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(order.id)
        .bind(order.passenger_id)
        .bind(order.ticket_id)
        .bind(order.status.as_str())
        .bind(order.total_price)
        .bind(order.purchase_time)
        .bind(order.refund_amount)
        .bind(order.refund_time)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE orders SET status = $1, refund_amount = $2, refund_time = $3 WHERE id = $4",
        )
        .bind(order.status.as_str())
        .bind(order.refund_amount)
        .bind(order.refund_time)
        .bind(order.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update_user_loyalty(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET accumulated_miles = $1, ticket_count = $2 WHERE id = $3")
            .bind(user.accumulated_miles)
            .bind(user.ticket_count)
            .bind(user.id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_err)
    }
}
