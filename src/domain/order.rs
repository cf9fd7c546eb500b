use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Column width of `order_items.flavor` and `order_items.size`.
pub const MAX_ITEM_LABEL_LEN: usize = 100;

/// Order lifecycle.
///
/// ```text
/// PENDING ──┬──► FINALIZED
///           └──► CANCELED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Finalized,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Finalized | OrderStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Finalized => "FINALIZED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// Returns `target` if the move is allowed from `self`.
    pub fn transition_to(self, target: OrderStatus) -> Result<OrderStatus, DomainError> {
        match (self, target) {
            (OrderStatus::Pending, OrderStatus::Finalized)
            | (OrderStatus::Pending, OrderStatus::Canceled) => Ok(target),
            (from, to) => Err(DomainError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "FINALIZED" => Ok(OrderStatus::Finalized),
            "CANCELED" => Ok(OrderStatus::Canceled),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub quantity: i32,
    pub flavor: String,
    pub size: String,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub quantity: i32,
    pub flavor: String,
    pub size: String,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// The order aggregate. `status`, `total` and `items` are only reachable
/// through methods so the total can never drift from the items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    status: OrderStatus,
    total: BigDecimal,
    items: Vec<OrderItem>,
}

impl Order {
    pub fn new(owner_user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            created_at: now,
            updated_at: now,
            status: OrderStatus::Pending,
            total: BigDecimal::from(0),
            items: Vec::new(),
        }
    }

    /// Rebuilds an order from storage. The total is derived from `items`.
    pub fn restore(
        id: Uuid,
        owner_user_id: Uuid,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        items: Vec<OrderItem>,
    ) -> Self {
        let mut order = Self {
            id,
            owner_user_id,
            created_at,
            updated_at,
            status,
            total: BigDecimal::from(0),
            items,
        };
        order.recompute_total();
        order
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> &BigDecimal {
        &self.total
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn add_item(&mut self, input: NewOrderItem) -> Result<OrderItem, DomainError> {
        self.ensure_open()?;
        if input.quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be positive, got {}",
                input.quantity
            )));
        }
        if input.unit_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(format!(
                "unit_price must not be negative, got {}",
                input.unit_price
            )));
        }
        check_label("flavor", &input.flavor)?;
        check_label("size", &input.size)?;

        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: self.id,
            quantity: input.quantity,
            flavor: input.flavor,
            size: input.size,
            unit_price: input.unit_price,
            created_at: Utc::now(),
        };
        self.items.push(item.clone());
        self.recompute_total();
        self.touch();
        Ok(item)
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Result<OrderItem, DomainError> {
        self.ensure_open()?;
        let position = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(DomainError::NotFound("Order item"))?;
        let removed = self.items.remove(position);
        self.recompute_total();
        self.touch();
        Ok(removed)
    }

    pub fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .fold(BigDecimal::from(0), |acc, item| acc + item.line_total());
    }

    pub fn finalize(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(OrderStatus::Finalized)?;
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(OrderStatus::Canceled)?;
        self.touch();
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::OrderClosed(self.status));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_label(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidInput(format!("{} is required", field)));
    }
    // VARCHAR limits count characters, not bytes.
    if value.chars().count() > MAX_ITEM_LABEL_LEN {
        return Err(DomainError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, MAX_ITEM_LABEL_LEN
        )));
    }
    Ok(())
}
