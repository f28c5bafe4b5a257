pub mod inventory;
pub mod search;
pub mod tickets;

pub use inventory::InventoryError;
pub use tickets::MinAdultPrice;
