use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{ensure_admin, ensure_owner_or_admin};
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrderItem, Order, OrderItem};
use crate::domain::ports::OrderRepository;
use crate::domain::user::User;

/// Order use cases. Every call is gated on the principal and runs as a single
/// repository unit of work.
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Creates an order for `owner_user_id`, defaulting to the principal.
    pub fn create_order(
        &self,
        principal: &User,
        owner_user_id: Option<Uuid>,
    ) -> Result<Order, DomainError> {
        let owner = owner_user_id.unwrap_or(principal.id);
        ensure_owner_or_admin(principal, owner)?;

        let order = Order::new(owner);
        self.repo.insert(&order)?;
        log::info!("Order {} created for user {} by {}", order.id, owner, principal.id);
        Ok(order)
    }

    pub fn get_order(&self, principal: &User, order_id: Uuid) -> Result<Order, DomainError> {
        let order = self
            .repo
            .find_by_id(order_id)?
            .ok_or(DomainError::NotFound("Order"))?;
        ensure_owner_or_admin(principal, order.owner_user_id)?;
        Ok(order)
    }

    pub fn add_item(
        &self,
        principal: &User,
        order_id: Uuid,
        item: NewOrderItem,
    ) -> Result<(Order, OrderItem), DomainError> {
        let mut added = None;
        let order = self.repo.update(order_id, &mut |order| {
            ensure_owner_or_admin(principal, order.owner_user_id)?;
            added = Some(order.add_item(item.clone())?);
            Ok(())
        })?;
        let added = added.ok_or_else(|| DomainError::Internal("item was not added".to_string()))?;
        log::info!("Item {} added to order {}", added.id, order.id);
        Ok((order, added))
    }

    pub fn remove_item(&self, principal: &User, item_id: Uuid) -> Result<Order, DomainError> {
        let order_id = self
            .repo
            .find_order_id_for_item(item_id)?
            .ok_or(DomainError::NotFound("Order item"))?;

        let order = self.repo.update(order_id, &mut |order| {
            ensure_owner_or_admin(principal, order.owner_user_id)?;
            order.remove_item(item_id).map(|_| ())
        })?;
        log::info!("Item {} removed from order {}", item_id, order.id);
        Ok(order)
    }

    pub fn finalize(&self, principal: &User, order_id: Uuid) -> Result<Order, DomainError> {
        let order = self.repo.update(order_id, &mut |order| {
            ensure_owner_or_admin(principal, order.owner_user_id)?;
            order.finalize()
        })?;
        log::info!("Order {} finalized by {}", order.id, principal.id);
        Ok(order)
    }

    pub fn cancel(&self, principal: &User, order_id: Uuid) -> Result<Order, DomainError> {
        let order = self.repo.update(order_id, &mut |order| {
            ensure_owner_or_admin(principal, order.owner_user_id)?;
            order.cancel()
        })?;
        log::info!("Order {} canceled by {}", order.id, principal.id);
        Ok(order)
    }

    /// Admin only.
    pub fn list_all(&self, principal: &User) -> Result<Vec<Order>, DomainError> {
        ensure_admin(principal)?;
        self.repo.list_all()
    }

    pub fn list_mine(&self, principal: &User) -> Result<Vec<Order>, DomainError> {
        self.repo.list_by_owner(principal.id)
    }
}
