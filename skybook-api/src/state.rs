use std::sync::Arc;

use skybook_core::Store;
use skybook_order::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            service: Arc::new(BookingService::new(store.clone())),
            store,
        }
    }
}
