pub mod account;
pub mod flight;
pub mod order;
