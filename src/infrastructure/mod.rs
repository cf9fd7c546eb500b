pub mod memory;
pub mod models;
pub mod order_repo;
pub mod user_repo;

pub use memory::InMemoryStore;
pub use order_repo::DieselOrderRepository;
pub use user_repo::DieselUserRepository;

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
