//! Order repository for `PostgreSQL`.
//!
//! Status transitions are single conditional UPDATE statements; the
//! affected-row count decides who won a race. The
//! `orders_one_active_per_driver` partial unique index makes the
//! one-active-order-per-driver invariant atomic with the accept transition
//! itself, so the service-level pre-check is only a fast path for a
//! friendlier error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use reparto_core::{Coordinates, OrderId, OrderStatus, ProductId, UserId};

use super::{AcceptOutcome, OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem};

/// Order header columns with display names joined in.
const ORDER_SELECT: &str = r"
    SELECT o.id, o.customer_id, u_c.full_name AS customer_name,
           o.driver_id, u_d.full_name AS driver_name,
           o.status, o.origin_lat, o.origin_lng, o.dest_lat, o.dest_lng,
           o.destination_address, o.total_price, o.created_at
    FROM orders o
    JOIN users u_c ON o.customer_id = u_c.id
    LEFT JOIN users u_d ON o.driver_id = u_d.id
";

/// Repository for order database operations.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r"
            SELECT oi.product_id, p.name AS product_name, oi.quantity, oi.price_at_order
            FROM order_items oi
            JOIN products p ON oi.product_id = p.id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }

    async fn load_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = row.into_order()?;
            order.items = self.load_items(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_with_items(&self, order: NewOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO orders (customer_id, status, origin_lat, origin_lng,
                                dest_lat, dest_lng, destination_address, total_price)
            VALUES ($1, 'PENDING', $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(order.customer_id)
        .bind(order.origin.lat())
        .bind(order.origin.lng())
        .bind(order.destination.lat())
        .bind(order.destination.lng())
        .bind(&order.destination_address)
        .bind(order.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, price_at_order)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price_at_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.id = $1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut order = row.into_order()?;
                order.items = self.load_items(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    async fn pending(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.status = 'PENDING' ORDER BY o.created_at DESC");
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        self.load_orders(rows).await
    }

    async fn history_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "{ORDER_SELECT} WHERE (o.customer_id = $1 OR o.driver_id = $1) \
             AND o.status = 'DELIVERED' ORDER BY o.created_at DESC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        self.load_orders(rows).await
    }

    async fn has_active_order(&self, driver_id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE driver_id = $1 AND status = 'ASSIGNED')",
        )
        .bind(driver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn accept(
        &self,
        id: OrderId,
        driver_id: UserId,
    ) -> Result<AcceptOutcome, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET driver_id = $2, status = 'ASSIGNED'
            WHERE id = $1 AND status = 'PENDING'
            ",
        )
        .bind(id)
        .bind(driver_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(AcceptOutcome::Accepted),
            Ok(_) => Ok(AcceptOutcome::NotAvailable),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // orders_one_active_per_driver fired: the driver already
                // holds an ASSIGNED order.
                Ok(AcceptOutcome::DriverBusy)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete(&self, id: OrderId, driver_id: UserId) -> Result<bool, RepositoryError> {
        let done = sqlx::query(
            r"
            UPDATE orders
            SET status = 'DELIVERED'
            WHERE id = $1 AND driver_id = $2 AND status = 'ASSIGNED'
            ",
        )
        .bind(id)
        .bind(driver_id)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() == 1)
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: UserId,
    customer_name: String,
    driver_id: Option<UserId>,
    driver_name: Option<String>,
    status: OrderStatus,
    origin_lat: f64,
    origin_lng: f64,
    dest_lat: f64,
    dest_lng: f64,
    destination_address: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let origin = Coordinates::new(self.origin_lat, self.origin_lng).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid origin on order {}: {e}", self.id))
        })?;
        let destination = Coordinates::new(self.dest_lat, self.dest_lng).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid destination on order {}: {e}",
                self.id
            ))
        })?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            driver_id: self.driver_id,
            driver_name: self.driver_name,
            status: self.status,
            origin,
            destination,
            destination_address: self.destination_address,
            total_price: self.total_price,
            created_at: self.created_at,
            items: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    price_at_order: Decimal,
}

impl ItemRow {
    fn into_item(self) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            price_at_order: self.price_at_order,
        }
    }
}
