use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::{OrderMutation, OrderRepository, UserRepository};
use crate::domain::user::{NewUser, User};

#[derive(Default)]
struct State {
    users: Vec<User>,
    orders: Vec<Order>,
}

/// In-process store implementing both repositories.
///
/// Provides the same interface and transactional guarantees as the Postgres
/// repositories: a single mutex stands in for the database, and `update`
/// works on a copy that only replaces the stored order when the mutation
/// succeeds.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store poisoned".to_string()))
    }
}

impl UserRepository for InMemoryStore {
    fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            active: user.active,
            is_admin: user.is_admin,
            created_at: chrono::Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }
}

impl OrderRepository for InMemoryStore {
    fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if !state.users.iter().any(|u| u.id == order.owner_user_id) {
            return Err(DomainError::NotFound("User"));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.lock()?.orders.iter().find(|o| o.id == id).cloned())
    }

    fn find_order_id_for_item(&self, item_id: Uuid) -> Result<Option<Uuid>, DomainError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .find(|o| o.items().iter().any(|item| item.id == item_id))
            .map(|o| o.id))
    }

    fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.lock()?.orders.clone())
    }

    fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.owner_user_id == owner_user_id)
            .cloned()
            .collect())
    }

    fn update(&self, id: Uuid, mutate: OrderMutation<'_>) -> Result<Order, DomainError> {
        let mut state = self.lock()?;
        let slot = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound("Order"))?;

        let mut draft = slot.clone();
        mutate(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }
}
