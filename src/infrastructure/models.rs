use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderStatus};
use crate::domain::user::{NewUser, User};
use crate::schema::{order_items, orders, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub is_admin: bool,
}

impl From<NewUser> for NewUserRow {
    fn from(user: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            active: user.active,
            is_admin: user.is_admin,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            active: row.active,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

/// Orders are written whole, so the same struct serves reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub status: String,
    pub total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            owner_user_id: order.owner_user_id,
            status: order.status().as_str().to_string(),
            total: order.total().clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Order::restore(
            self.id,
            self.owner_user_id,
            status,
            self.created_at,
            self.updated_at,
            items.into_iter().map(OrderItem::from).collect(),
        ))
    }
}

#[derive(
    Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable,
)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub quantity: i32,
    pub flavor: String,
    pub size: String,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderItem> for OrderItemRow {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            order_id: item.order_id,
            quantity: item.quantity,
            flavor: item.flavor.clone(),
            size: item.size.clone(),
            unit_price: item.unit_price.clone(),
            created_at: item.created_at,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            quantity: row.quantity,
            flavor: row.flavor,
            size: row.size,
            unit_price: row.unit_price,
            created_at: row.created_at,
        }
    }
}
