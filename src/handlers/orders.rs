use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{NewOrderItem, Order, OrderItem};
use crate::errors::AppError;
use crate::AppState;

use super::blocking;
use super::extract::BearerToken;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    /// Defaults to the caller. Only admins may create orders for others.
    pub owner_user_id: Option<Uuid>,
}

impl CreateOrderRequest {
    /// The body is optional, but a body that is present must parse.
    fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid order request: {}", e)))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub quantity: i32,
    pub flavor: String,
    pub size: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
}

impl AddItemRequest {
    fn into_domain(self) -> Result<NewOrderItem, AppError> {
        let unit_price = BigDecimal::from_str(&self.unit_price).map_err(|e| {
            AppError::BadRequest(format!("Invalid unit_price '{}': {}", self.unit_price, e))
        })?;
        Ok(NewOrderItem {
            quantity: self.quantity,
            flavor: self.flavor,
            size: self.size,
            unit_price,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub quantity: i32,
    pub flavor: String,
    pub size: String,
    pub unit_price: String,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            quantity: item.quantity,
            flavor: item.flavor.clone(),
            size: item.size.clone(),
            unit_price: item.unit_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub status: String,
    pub total: String,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            owner_user_id: order.owner_user_id,
            status: order.status().as_str().to_string(),
            total: order.total().to_string(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub item_count: usize,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddItemResponse {
    pub item_id: Uuid,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

impl ListOrdersResponse {
    fn new(orders: &[Order]) -> Self {
        Self {
            orders: orders.iter().map(OrderResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates an empty PENDING order.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Not authenticated, or not allowed to create for that owner"),
        (status = 404, description = "Owner does not exist"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    token: BearerToken,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let body = CreateOrderRequest::from_body(&body)?;

    let order = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.create_order(&principal, body.owner_user_id)
    })
    .await?;

    Ok(HttpResponse::Created().json(OrderResponse::from(&order)))
}

/// GET /orders
///
/// Lists every order. Admin only.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders", body = ListOrdersResponse),
        (status = 401, description = "Not authenticated or not an admin"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    token: BearerToken,
) -> Result<HttpResponse, AppError> {
    let orders = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.list_all(&principal)
    })
    .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(&orders)))
}

/// GET /orders/mine
///
/// Lists the caller's own orders.
#[utoipa::path(
    get,
    path = "/orders/mine",
    responses(
        (status = 200, description = "The caller's orders", body = ListOrdersResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "orders"
)]
pub async fn list_my_orders(
    state: web::Data<AppState>,
    token: BearerToken,
) -> Result<HttpResponse, AppError> {
    let orders = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.list_mine(&principal)
    })
    .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(&orders)))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderDetailResponse),
        (status = 401, description = "Not authenticated or not the owner"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.get_order(&principal, order_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(OrderDetailResponse {
        item_count: order.items().len(),
        order: OrderResponse::from(&order),
    }))
}

/// POST /orders/{id}/items
#[utoipa::path(
    post,
    path = "/orders/{id}/items",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added", body = AddItemResponse),
        (status = 400, description = "Invalid quantity or price"),
        (status = 401, description = "Not authenticated or not the owner"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is finalized or canceled"),
    ),
    tag = "orders"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<Uuid>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let item = body.into_inner().into_domain()?;

    let (order, added) = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.add_item(&principal, order_id, item)
    })
    .await?;

    Ok(HttpResponse::Created().json(AddItemResponse {
        item_id: added.id,
        order: OrderResponse::from(&order),
    }))
}

/// DELETE /orders/items/{item_id}
#[utoipa::path(
    delete,
    path = "/orders/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Order item UUID"),
    ),
    responses(
        (status = 200, description = "Item removed", body = OrderResponse),
        (status = 401, description = "Not authenticated or not the owner"),
        (status = 404, description = "Order item not found"),
        (status = 409, description = "Order is finalized or canceled"),
    ),
    tag = "orders"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();

    let order = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.remove_item(&principal, item_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/finalize
#[utoipa::path(
    post,
    path = "/orders/{id}/finalize",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order finalized", body = OrderResponse),
        (status = 401, description = "Not authenticated or not the owner"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not PENDING"),
    ),
    tag = "orders"
)]
pub async fn finalize_order(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.finalize(&principal, order_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order canceled", body = OrderResponse),
        (status = 401, description = "Not authenticated or not the owner"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not PENDING"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = blocking(move || {
        let principal = state.auth.resolve_principal(token.as_str())?;
        state.orders.cancel(&principal, order_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_create_body_means_the_caller() {
        assert!(CreateOrderRequest::from_body(b"").expect("empty").owner_user_id.is_none());
        assert!(CreateOrderRequest::from_body(b" \n").expect("blank").owner_user_id.is_none());
        assert!(CreateOrderRequest::from_body(b"{}").expect("object").owner_user_id.is_none());
    }

    #[test]
    fn create_body_names_the_owner() {
        let owner = Uuid::new_v4();
        let body = format!(r#"{{"owner_user_id":"{}"}}"#, owner);

        let request = CreateOrderRequest::from_body(body.as_bytes()).expect("parse");

        assert_eq!(request.owner_user_id, Some(owner));
    }

    #[test]
    fn malformed_create_body_is_rejected() {
        for body in [
            r#"{"owner_user_id":"not-a-uuid"}"#,
            r#"{"owner_id":"6f1c1d0e-3b1a-4a8e-9d5b-2f9f2b7c1a00"}"#,
            "{",
        ] {
            assert!(
                matches!(
                    CreateOrderRequest::from_body(body.as_bytes()),
                    Err(AppError::BadRequest(_))
                ),
                "body {}",
                body
            );
        }
    }
}
