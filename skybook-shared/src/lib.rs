pub mod models;

pub use models::account::{Passenger, PassengerType, User};
pub use models::flight::{Airport, City, Flight, Plane, SeatClass, Ticket};
pub use models::order::{Order, OrderStatus};
