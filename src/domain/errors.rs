use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Email already registered")]
    DuplicateEmail,
    /// Deliberately shared by "no such user" and "wrong password".
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Not authorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order is {0} and can no longer be modified")]
    OrderClosed(OrderStatus),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
