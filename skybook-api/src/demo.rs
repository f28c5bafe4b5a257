//! Demo dataset for the in-memory backend. Seeds a small route network
//! (two cities, three airports, two flights) plus a demo account so the
//! API is usable out of the box with `Authorization: Bearer alice`.

use chrono::{Duration, Utc};
use uuid::Uuid;

use skybook_shared::{
    Airport, City, Flight, Passenger, PassengerType, Plane, SeatClass, Ticket, User,
};
use skybook_store::MemoryStore;

pub async fn seed(store: &MemoryStore) {
    let plane = Plane {
        id: Uuid::new_v4(),
        model: "B737-800".to_string(),
        first_class_seats: 8,
        business_seats: 24,
        economy_seats: 150,
    };
    store.add_plane(plane.clone()).await;

    for city in [
        City {
            city_code: "BJS".to_string(),
            city_name: "Beijing".to_string(),
            province: "Beijing".to_string(),
            phonetic_key: "beijing".to_string(),
        },
        City {
            city_code: "SHA".to_string(),
            city_name: "Shanghai".to_string(),
            province: "Shanghai".to_string(),
            phonetic_key: "shanghai".to_string(),
        },
    ] {
        store.add_city(city).await;
    }

    for airport in [
        Airport {
            airport_code: "PEK".to_string(),
            iata_code: "PEK".to_string(),
            airport_name: "Beijing Capital".to_string(),
            city_code: "BJS".to_string(),
        },
        Airport {
            airport_code: "PVG".to_string(),
            iata_code: "PVG".to_string(),
            airport_name: "Shanghai Pudong".to_string(),
            city_code: "SHA".to_string(),
        },
        Airport {
            airport_code: "SHA".to_string(),
            iata_code: "SHA".to_string(),
            airport_name: "Shanghai Hongqiao".to_string(),
            city_code: "SHA".to_string(),
        },
    ] {
        store.add_airport(airport).await;
    }

    let now = Utc::now();
    let outbound = Flight {
        id: Uuid::new_v4(),
        flight_number: "SB1024".to_string(),
        departure_time: now + Duration::hours(26),
        arrival_time: now + Duration::hours(28),
        departure_airport: "PEK".to_string(),
        arrival_airport: "PVG".to_string(),
        remaining_first_class_seats: plane.first_class_seats,
        remaining_business_seats: plane.business_seats,
        remaining_economy_seats: plane.economy_seats,
        distance: 1178.0,
        plane_id: plane.id,
    };
    let inbound = Flight {
        id: Uuid::new_v4(),
        flight_number: "SB1025".to_string(),
        departure_time: now + Duration::hours(50),
        arrival_time: now + Duration::hours(52),
        departure_airport: "SHA".to_string(),
        arrival_airport: "PEK".to_string(),
        remaining_first_class_seats: plane.first_class_seats,
        remaining_business_seats: plane.business_seats,
        remaining_economy_seats: plane.economy_seats,
        distance: 1178.0,
        plane_id: plane.id,
    };

    for flight in [&outbound, &inbound] {
        store.add_flight(flight.clone()).await;
        for (seat_class, ticket_type, price) in [
            (SeatClass::Economy, PassengerType::Adult, 850.0),
            (SeatClass::Economy, PassengerType::Student, 640.0),
            (SeatClass::Business, PassengerType::Adult, 2100.0),
            (SeatClass::FirstClass, PassengerType::Adult, 3800.0),
        ] {
            store
                .add_ticket(Ticket {
                    id: Uuid::new_v4(),
                    flight_id: flight.id,
                    seat_class,
                    ticket_type,
                    price,
                    baggage_allowance_kg: 20.0,
                })
                .await;
        }
    }

    let alice = User {
        id: Uuid::new_v4(),
        name: "alice".to_string(),
        email: "alice@example.com".to_string(),
        accumulated_miles: 0.0,
        ticket_count: 0,
    };
    store.add_user(alice.clone()).await;

    for passenger in [
        Passenger {
            id: Uuid::new_v4(),
            name: "Alice Zhang".to_string(),
            person_type: PassengerType::Adult,
            phone_number: "13800000001".to_string(),
            email: Some("alice@example.com".to_string()),
        },
        Passenger {
            id: Uuid::new_v4(),
            name: "Bob Zhang".to_string(),
            person_type: PassengerType::Student,
            phone_number: "13800000002".to_string(),
            email: None,
        },
    ] {
        store.add_passenger(passenger.clone()).await;
        store.link_user_passenger(alice.id, passenger.id).await;
    }

    tracing::info!(
        outbound = %outbound.flight_number,
        inbound = %inbound.flight_number,
        "seeded demo dataset"
    );
}
