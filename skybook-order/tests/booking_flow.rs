use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use skybook_core::{BookingError, Store};
use skybook_order::BookingService;
use skybook_shared::{
    Airport, City, Flight, OrderStatus, Passenger, PassengerType, Plane, SeatClass, Ticket, User,
};
use skybook_store::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    service: BookingService,
    user: User,
    stranger: User,
    adult: Passenger,
    student: Passenger,
    flight: Flight,
    adult_economy: Ticket,
    student_economy: Ticket,
}

async fn fixture(economy_seats_remaining: i32) -> Fixture {
    let store = Arc::new(MemoryStore::new());

    let plane = Plane {
        id: Uuid::new_v4(),
        model: "B737-800".to_string(),
        first_class_seats: 8,
        business_seats: 24,
        economy_seats: 160,
    };
    let departure = Utc::now() + Duration::hours(24);
    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: "SB1024".to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::hours(3),
        departure_airport: "ZBAA".to_string(),
        arrival_airport: "ZGGG".to_string(),
        remaining_first_class_seats: 8,
        remaining_business_seats: 24,
        remaining_economy_seats: economy_seats_remaining,
        distance: 1180.5,
        plane_id: plane.id,
    };

    let adult_economy = Ticket {
        id: Uuid::new_v4(),
        flight_id: flight.id,
        seat_class: SeatClass::Economy,
        ticket_type: PassengerType::Adult,
        price: 850.0,
        baggage_allowance_kg: 20.0,
    };
    let student_economy = Ticket {
        id: Uuid::new_v4(),
        flight_id: flight.id,
        seat_class: SeatClass::Economy,
        ticket_type: PassengerType::Student,
        price: 640.0,
        baggage_allowance_kg: 20.0,
    };

    let user = User {
        id: Uuid::new_v4(),
        name: "alice".to_string(),
        email: "alice@example.com".to_string(),
        accumulated_miles: 0.0,
        ticket_count: 0,
    };
    let stranger = User {
        id: Uuid::new_v4(),
        name: "mallory".to_string(),
        email: "mallory@example.com".to_string(),
        accumulated_miles: 0.0,
        ticket_count: 0,
    };
    let adult = Passenger {
        id: Uuid::new_v4(),
        name: "Alice Zhang".to_string(),
        person_type: PassengerType::Adult,
        phone_number: "13800000001".to_string(),
        email: None,
    };
    let student = Passenger {
        id: Uuid::new_v4(),
        name: "Bob Li".to_string(),
        person_type: PassengerType::Student,
        phone_number: "13800000002".to_string(),
        email: None,
    };

    store.add_plane(plane.clone()).await;
    store.add_flight(flight.clone()).await;
    store.add_ticket(adult_economy.clone()).await;
    store.add_ticket(student_economy.clone()).await;
    store.add_user(user.clone()).await;
    store.add_user(stranger.clone()).await;
    store.add_passenger(adult.clone()).await;
    store.add_passenger(student.clone()).await;
    store.link_user_passenger(user.id, adult.id).await;
    store.link_user_passenger(user.id, student.id).await;

    let service = BookingService::new(store.clone());
    Fixture {
        store,
        service,
        user,
        stranger,
        adult,
        student,
        flight,
        adult_economy,
        student_economy,
    }
}

async fn remaining_economy(fx: &Fixture) -> i32 {
    fx.store
        .get_flight(fx.flight.id)
        .await
        .unwrap()
        .unwrap()
        .remaining_economy_seats
}

#[tokio::test]
async fn test_purchase_creates_pending_order_and_takes_seat() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, 850.0);
    assert_eq!(remaining_economy(&fx).await, 4);
}

#[tokio::test]
async fn test_purchase_sold_out_leaves_counters_unchanged() {
    let fx = fixture(0).await;
    let err = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::SeatUnavailable(SeatClass::Economy)));
    assert_eq!(remaining_economy(&fx).await, 0);
}

#[tokio::test]
async fn test_adult_fare_accepts_any_passenger_type() {
    let fx = fixture(5).await;
    fx.service
        .purchase(fx.student.id, fx.adult_economy.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restricted_fare_rejects_other_types() {
    let fx = fixture(5).await;
    let err = fx
        .service
        .purchase(fx.adult.id, fx.student_economy.id)
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::TypeMismatch { .. }));
    assert_eq!(remaining_economy(&fx).await, 5);
}

#[tokio::test]
async fn test_confirmed_order_blocks_duplicate_purchase_but_pending_does_not() {
    let fx = fixture(5).await;
    let first = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    // A pending order for the same passenger+ticket is not a duplicate
    fx.service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    fx.service.confirm_order(first.id, fx.user.id).await.unwrap();

    let err = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DuplicatePurchase));
}

#[tokio::test]
async fn test_confirm_credits_loyalty_exactly_once() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    let confirmed = fx.service.confirm_order(order.id, fx.user.id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 1180.5);
    assert_eq!(user.ticket_count, 1);

    // Seats are not touched again at confirm time
    assert_eq!(remaining_economy(&fx).await, 4);

    let err = fx
        .service
        .confirm_order(order.id, fx.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));

    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 1180.5);
    assert_eq!(user.ticket_count, 1);
}

#[tokio::test]
async fn test_confirm_by_unrelated_user_is_forbidden() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    let err = fx
        .service
        .confirm_order(order.id, fx.stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden));

    let stored = fx.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_cancel_by_unrelated_user_is_forbidden() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    let err = fx
        .service
        .cancel_order(order.id, fx.stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden));

    // Order and seat untouched
    let stored = fx.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(remaining_economy(&fx).await, 4);
}

#[tokio::test]
async fn test_order_detail_by_unrelated_user_is_forbidden() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    let err = fx
        .service
        .order_detail(order.id, fx.stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden));

    let detail = fx.service.order_detail(order.id, fx.user.id).await.unwrap();
    assert_eq!(detail.order.id, order.id);
}

#[tokio::test]
async fn test_cancel_pending_restores_seat_without_ledger_change() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();
    assert_eq!(remaining_economy(&fx).await, 4);

    let canceled = fx.service.cancel_order(order.id, fx.user.id).await.unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert!(canceled.refund_amount.is_none());
    assert!(canceled.refund_time.is_none());
    assert_eq!(remaining_economy(&fx).await, 5);

    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 0.0);
    assert_eq!(user.ticket_count, 0);
}

#[tokio::test]
async fn test_cancel_confirmed_refunds_and_debits_ledger() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();
    fx.service.confirm_order(order.id, fx.user.id).await.unwrap();

    let refunded = fx.service.cancel_order(order.id, fx.user.id).await.unwrap();
    assert_eq!(refunded.status, OrderStatus::Refunded);
    assert_eq!(refunded.refund_amount, Some(850.0 * 0.8));
    assert!(refunded.refund_time.is_some());
    assert_eq!(remaining_economy(&fx).await, 5);

    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 0.0);
    assert_eq!(user.ticket_count, 0);
}

#[tokio::test]
async fn test_cancel_after_departure_is_rejected() {
    let fx = fixture(5).await;
    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();

    // Move the flight into the past
    let mut departed = fx.flight.clone();
    departed.departure_time = Utc::now() - Duration::hours(1);
    departed.remaining_economy_seats = 4;
    fx.store.add_flight(departed).await;

    let err = fx
        .service
        .cancel_order(order.id, fx.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
    assert_eq!(remaining_economy(&fx).await, 4);
}

#[tokio::test]
async fn test_list_orders_newest_first_with_status_filter() {
    let fx = fixture(5).await;
    let first = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();
    // Keep purchase_time strictly increasing for the ordering assertion
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = fx
        .service
        .purchase(fx.student.id, fx.adult_economy.id)
        .await
        .unwrap();
    fx.service.confirm_order(second.id, fx.user.id).await.unwrap();

    let all = fx.service.list_orders(fx.user.id, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].order_id, second.id);
    assert_eq!(all[1].order_id, first.id);

    let confirmed = fx
        .service
        .list_orders(fx.user.id, Some(OrderStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].order_id, second.id);

    // A user with no passengers sees nothing
    let empty = fx.service.list_orders(fx.stranger.id, None).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_contended_purchases_sell_exactly_the_remaining_seats() {
    const SEATS: i32 = 3;
    const BUYERS: usize = 10;

    let fx = fixture(SEATS).await;
    let service = Arc::new(fx.service);

    let mut passenger_ids = Vec::new();
    for i in 0..BUYERS {
        let p = Passenger {
            id: Uuid::new_v4(),
            name: format!("Buyer {}", i),
            person_type: PassengerType::Adult,
            phone_number: format!("1390000{:04}", i),
            email: None,
        };
        fx.store.add_passenger(p.clone()).await;
        passenger_ids.push(p.id);
    }

    let mut handles = Vec::new();
    for pid in passenger_ids {
        let service = service.clone();
        let ticket_id = fx.adult_economy.id;
        handles.push(tokio::spawn(async move {
            service.purchase(pid, ticket_id).await
        }));
    }

    let mut ok = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(BookingError::SeatUnavailable(_)) => sold_out += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, SEATS as usize);
    assert_eq!(sold_out, BUYERS - SEATS as usize);

    let flight = fx.store.get_flight(fx.flight.id).await.unwrap().unwrap();
    assert_eq!(flight.remaining_economy_seats, 0);
}

/// The end-to-end scenario: one economy seat, two buyers, confirm,
/// then refund.
#[tokio::test]
async fn test_single_seat_purchase_confirm_refund_scenario() {
    let fx = fixture(1).await;

    let order = fx
        .service
        .purchase(fx.adult.id, fx.adult_economy.id)
        .await
        .unwrap();
    assert_eq!(remaining_economy(&fx).await, 0);

    let err = fx
        .service
        .purchase(fx.student.id, fx.adult_economy.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SeatUnavailable(_)));

    fx.service.confirm_order(order.id, fx.user.id).await.unwrap();
    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 1180.5);

    let refunded = fx.service.cancel_order(order.id, fx.user.id).await.unwrap();
    assert_eq!(refunded.refund_amount, Some(850.0 * 0.8));
    assert_eq!(remaining_economy(&fx).await, 1);

    let user = fx.store.get_user(fx.user.id).await.unwrap().unwrap();
    assert_eq!(user.accumulated_miles, 0.0);
    assert_eq!(user.ticket_count, 0);
}

#[tokio::test]
async fn test_search_cities_and_flights() {
    let fx = fixture(5).await;
    fx.store
        .add_city(City {
            city_code: "BJS".to_string(),
            city_name: "Beijing".to_string(),
            province: "Beijing".to_string(),
            phonetic_key: "BJ".to_string(),
        })
        .await;
    fx.store
        .add_city(City {
            city_code: "CAN".to_string(),
            city_name: "Guangzhou".to_string(),
            province: "Guangdong".to_string(),
            phonetic_key: "GZ".to_string(),
        })
        .await;
    fx.store
        .add_airport(Airport {
            airport_code: "ZBAA".to_string(),
            iata_code: "PEK".to_string(),
            airport_name: "Beijing Capital".to_string(),
            city_code: "BJS".to_string(),
        })
        .await;
    fx.store
        .add_airport(Airport {
            airport_code: "ZGGG".to_string(),
            iata_code: "CAN".to_string(),
            airport_name: "Guangzhou Baiyun".to_string(),
            city_code: "CAN".to_string(),
        })
        .await;

    let cities = fx.service.search_cities(Some("guang")).await.unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].city_code, "CAN");

    let date = fx.flight.departure_time.date_naive().to_string();
    let flights = fx
        .service
        .search_flights(Some("BJS"), Some("CAN"), Some(&date))
        .await
        .unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0].flight_id, fx.flight.id);
    assert_eq!(flights[0].departure_airport, "Beijing Capital");
    assert_eq!(flights[0].plane_model, "B737-800");

    // Day after the flight: the window is half-open
    let next_day = (fx.flight.departure_time + Duration::days(1))
        .date_naive()
        .to_string();
    let err = fx
        .service
        .search_flights(Some("BJS"), Some("CAN"), Some(&next_day))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));

    let err = fx
        .service
        .search_flights(None, Some("CAN"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::BadRequest(_)));

    let err = fx
        .service
        .search_flights(Some("XXX"), Some("CAN"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}
