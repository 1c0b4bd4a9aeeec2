use crate::{db::DbPool, events::EventSender, services};
use std::sync::Arc;

pub mod carts;
pub mod collections;
pub mod common;
pub mod customers;
pub mod orders;
pub mod products;
pub mod tags;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<services::CatalogService>,
    pub cart: Arc<services::CartService>,
    pub checkout: Arc<services::CheckoutService>,
    pub customer: Arc<services::CustomerService>,
    pub order: Arc<services::OrderService>,
    pub tag: Arc<services::TagService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            catalog: Arc::new(services::CatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(services::CartService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            checkout: Arc::new(services::CheckoutService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            customer: Arc::new(services::CustomerService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            order: Arc::new(services::OrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            tag: Arc::new(services::TagService::new(db_pool, event_sender)),
        }
    }
}
