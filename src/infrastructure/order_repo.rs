use std::collections::HashSet;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::{OrderMutation, OrderRepository};
use crate::schema::{order_items, orders};

use super::models::{OrderItemRow, OrderRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Attach each order's items, preserving the order of `rows`.
fn with_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let items = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?;

    items
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(items, row)| row.into_order(items))
        .collect()
}

fn load_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItemRow>, DomainError> {
    Ok(order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?)
}

impl OrderRepository for DieselOrderRepository {
    fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(OrderRow::from(order))
                .execute(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        DomainError::NotFound("User")
                    }
                    other => other.into(),
                })?;

            let items: Vec<OrderItemRow> = order.items().iter().map(OrderItemRow::from).collect();
            if !items.is_empty() {
                diesel::insert_into(order_items::table)
                    .values(&items)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_items(&mut conn, order.id)?;
        order.into_order(items).map(Some)
    }

    fn find_order_id_for_item(&self, item_id: Uuid) -> Result<Option<Uuid>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(order_items::table
            .find(item_id)
            .select(order_items::order_id)
            .first::<Uuid>(&mut conn)
            .optional()?)
    }

    fn list_all(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.asc())
                .load(conn)?;
            with_items(conn, rows)
        })
    }

    fn list_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let rows = orders::table
                .filter(orders::owner_user_id.eq(owner_user_id))
                .select(OrderRow::as_select())
                .order(orders::created_at.asc())
                .load(conn)?;
            with_items(conn, rows)
        })
    }

    fn update(&self, id: Uuid, mutate: OrderMutation<'_>) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serializes concurrent mutations of the same order.
            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .for_update()
                .first(conn)
                .optional()?;

            let Some(row) = row else {
                return Err(DomainError::NotFound("Order"));
            };

            let items = load_items(conn, id)?;
            let before: HashSet<Uuid> = items.iter().map(|item| item.id).collect();

            let mut order = row.into_order(items)?;
            mutate(&mut order)?;

            let after: HashSet<Uuid> = order.items().iter().map(|item| item.id).collect();
            let removed: Vec<Uuid> = before.difference(&after).copied().collect();
            let added: Vec<OrderItemRow> = order
                .items()
                .iter()
                .filter(|item| !before.contains(&item.id))
                .map(OrderItemRow::from)
                .collect();

            if !removed.is_empty() {
                diesel::delete(order_items::table.filter(order_items::id.eq_any(removed)))
                    .execute(conn)?;
            }
            if !added.is_empty() {
                diesel::insert_into(order_items::table)
                    .values(&added)
                    .execute(conn)?;
            }

            diesel::update(orders::table.find(id))
                .set((
                    orders::status.eq(order.status().as_str()),
                    orders::total.eq(order.total().clone()),
                    orders::updated_at.eq(order.updated_at),
                ))
                .execute(conn)?;

            Ok(order)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::db::testing::setup_db;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrderItem, Order, OrderStatus};
    use crate::domain::ports::{OrderRepository, UserRepository};
    use crate::domain::user::NewUser;
    use crate::infrastructure::DieselUserRepository;

    fn make_item(quantity: i32, price: &str) -> NewOrderItem {
        NewOrderItem {
            quantity,
            flavor: "margherita".to_string(),
            size: "medium".to_string(),
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
        }
    }

    fn make_owner(users: &DieselUserRepository) -> Uuid {
        users
            .create(NewUser {
                name: "Owner".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: "$argon2id$stub".to_string(),
                active: true,
                is_admin: false,
            })
            .expect("create user")
            .id
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn insert_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let users = DieselUserRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let owner = make_owner(&users);

        let order = Order::new(owner);
        repo.insert(&order).expect("insert failed");

        let found = repo
            .find_by_id(order.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(found.owner_user_id, owner);
        assert_eq!(found.status(), OrderStatus::Pending);
        assert!(found.items().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn insert_for_unknown_owner_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let err = repo.insert(&Order::new(Uuid::new_v4())).unwrap_err();

        assert!(matches!(err, DomainError::NotFound("User")));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn update_persists_item_diff_and_total() {
        let (_container, pool) = setup_db().await;
        let users = DieselUserRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let order = Order::new(make_owner(&users));
        repo.insert(&order).expect("insert failed");

        let mut first = None;
        repo.update(order.id, &mut |o| {
            first = Some(o.add_item(make_item(2, "10.0"))?.id);
            o.add_item(make_item(1, "5.0"))?;
            Ok(())
        })
        .expect("update failed");

        let stored = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(stored.items().len(), 2);
        assert_eq!(stored.total(), &BigDecimal::from(25));

        let first = first.expect("first item id");
        assert_eq!(repo.find_order_id_for_item(first).expect("find"), Some(order.id));

        repo.update(order.id, &mut |o| o.remove_item(first).map(|_| ()))
            .expect("remove failed");

        let stored = repo.find_by_id(order.id).expect("find").expect("exists");
        assert_eq!(stored.items().len(), 1);
        assert_eq!(stored.total(), &BigDecimal::from(5));
        assert_eq!(repo.find_order_id_for_item(first).expect("find"), None);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn failed_update_writes_nothing() {
        let (_container, pool) = setup_db().await;
        let users = DieselUserRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let order = Order::new(make_owner(&users));
        repo.insert(&order).expect("insert failed");

        let err = repo
            .update(order.id, &mut |o| {
                o.add_item(make_item(1, "3.00"))?;
                Err(DomainError::Unauthorized)
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized));
        let stored = repo.find_by_id(order.id).expect("find").expect("exists");
        assert!(stored.items().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn update_unknown_order_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let err = repo.update(Uuid::new_v4(), &mut |_| Ok(())).unwrap_err();

        assert!(matches!(err, DomainError::NotFound("Order")));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn list_by_owner_filters_and_list_all_keeps_insertion_order() {
        let (_container, pool) = setup_db().await;
        let users = DieselUserRepository::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let alice = make_owner(&users);
        let bob = make_owner(&users);

        let mut ids = Vec::new();
        for owner in [alice, bob, alice] {
            let order = Order::new(owner);
            repo.insert(&order).expect("insert failed");
            ids.push(order.id);
        }

        let all: Vec<Uuid> = repo.list_all().expect("list").iter().map(|o| o.id).collect();
        assert_eq!(all, ids);

        let mine = repo.list_by_owner(alice).expect("list");
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.owner_user_id == alice));
    }
}
