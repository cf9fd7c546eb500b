pub mod auth_service;
pub mod order_service;

pub use auth_service::{AuthService, NewAccount, TokenPair};
pub use order_service::OrderService;
