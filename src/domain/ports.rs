use uuid::Uuid;

use super::errors::DomainError;
use super::order::Order;
use super::user::{NewUser, User};

/// A change applied to a loaded order inside the repository's transaction.
/// Returning an error aborts the whole unit of work.
pub type OrderMutation<'a> = &'a mut dyn FnMut(&mut Order) -> Result<(), DomainError>;

pub trait UserRepository: Send + Sync + 'static {
    /// Fails with [`DomainError::DuplicateEmail`] when the email is taken.
    fn create(&self, user: NewUser) -> Result<User, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Fails with `NotFound("User")` when the owner does not exist.
    fn insert(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn find_order_id_for_item(&self, item_id: Uuid) -> Result<Option<Uuid>, DomainError>;
    /// All orders in insertion order.
    fn list_all(&self) -> Result<Vec<Order>, DomainError>;
    fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Order>, DomainError>;
    /// Loads order `id` exclusively, applies `mutate` and persists the result
    /// in one transaction. Nothing is written if `mutate` fails.
    fn update(&self, id: Uuid, mutate: OrderMutation<'_>) -> Result<Order, DomainError>;
}
