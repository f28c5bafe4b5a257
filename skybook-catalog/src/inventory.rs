use skybook_shared::{Flight, Plane, SeatClass};

/// Seat-counter arithmetic for a flight row.
///
/// These functions mutate the in-memory row only; the caller is
/// expected to hold the row's exclusive lock through a store
/// transaction and to persist the updated counters before commit.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("no available {0} seats")]
    SoldOut(SeatClass),

    #[error("releasing a {class} seat would exceed plane capacity {capacity}")]
    CapacityExceeded { class: SeatClass, capacity: i32 },
}

/// Take one seat of the given class. Fails without mutating when the
/// class is sold out.
pub fn reserve(flight: &mut Flight, class: SeatClass) -> Result<(), InventoryError> {
    let remaining = flight.seats_remaining_mut(class);
    if *remaining <= 0 {
        return Err(InventoryError::SoldOut(class));
    }
    *remaining -= 1;
    Ok(())
}

/// Return one seat of the given class, used on cancellation. The plane
/// capacity is the upper bound; exceeding it means the sold+remaining
/// invariant was already broken somewhere else.
pub fn release(flight: &mut Flight, class: SeatClass, plane: &Plane) -> Result<(), InventoryError> {
    let capacity = plane.capacity(class);
    let remaining = flight.seats_remaining_mut(class);
    if *remaining >= capacity {
        return Err(InventoryError::CapacityExceeded { class, capacity });
    }
    *remaining += 1;
    Ok(())
}

pub fn remaining(flight: &Flight, class: SeatClass) -> i32 {
    flight.seats_remaining(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn fixture() -> (Flight, Plane) {
        let plane = Plane {
            id: Uuid::new_v4(),
            model: "A320".to_string(),
            first_class_seats: 4,
            business_seats: 12,
            economy_seats: 150,
        };
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: "SB101".to_string(),
            departure_time: Utc::now(),
            arrival_time: Utc::now(),
            departure_airport: "ZBAA".to_string(),
            arrival_airport: "ZSPD".to_string(),
            remaining_first_class_seats: 4,
            remaining_business_seats: 12,
            remaining_economy_seats: 2,
            distance: 1088.0,
            plane_id: plane.id,
        };
        (flight, plane)
    }

    #[test]
    fn test_reserve_decrements_one_class_only() {
        let (mut flight, _) = fixture();
        reserve(&mut flight, SeatClass::Economy).unwrap();
        assert_eq!(flight.remaining_economy_seats, 1);
        assert_eq!(flight.remaining_business_seats, 12);
        assert_eq!(flight.remaining_first_class_seats, 4);
    }

    #[test]
    fn test_reserve_fails_when_sold_out_and_leaves_counter() {
        let (mut flight, _) = fixture();
        reserve(&mut flight, SeatClass::Economy).unwrap();
        reserve(&mut flight, SeatClass::Economy).unwrap();
        let err = reserve(&mut flight, SeatClass::Economy).unwrap_err();
        assert!(matches!(err, InventoryError::SoldOut(SeatClass::Economy)));
        assert_eq!(flight.remaining_economy_seats, 0);
    }

    #[test]
    fn test_release_restores_a_seat() {
        let (mut flight, plane) = fixture();
        reserve(&mut flight, SeatClass::Business).unwrap();
        release(&mut flight, SeatClass::Business, &plane).unwrap();
        assert_eq!(flight.remaining_business_seats, 12);
    }

    #[test]
    fn test_release_refuses_to_exceed_capacity() {
        let (mut flight, plane) = fixture();
        let err = release(&mut flight, SeatClass::FirstClass, &plane).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::CapacityExceeded { capacity: 4, .. }
        ));
        assert_eq!(flight.remaining_first_class_seats, 4);
    }
}
