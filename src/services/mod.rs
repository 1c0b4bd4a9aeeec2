/// Business logic services
pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod orders;
pub mod tags;

pub use carts::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use customers::CustomerService;
pub use orders::OrderService;
pub use tags::TagService;
