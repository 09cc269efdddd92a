use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CustomerId, Money, Order, OrderStatus, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderId, Result, StoreError, store::OrderStore};

const SELECT_COLUMNS: &str = "SELECT id, customer_id, product_id, quantity, total_amount_cents, status, created_at, updated_at FROM orders";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and returns a store on a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id: Uuid = row.try_get("id")?;
        let corrupt = |reason: String| StoreError::Corrupt {
            order_id: id.to_string(),
            reason,
        };

        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| corrupt(format!("quantity {quantity} out of range")))?;
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status.parse().map_err(|e| corrupt(format!("{e}")))?;

        Ok(Order::restore(
            OrderId::from_uuid(id),
            CustomerId::new(row.try_get::<String, _>("customer_id")?),
            ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity,
            Money::from_cents(row.try_get("total_amount_cents")?),
            status,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            row.try_get::<DateTime<Utc>, _>("updated_at")?,
        ))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let order_id = order.id();

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, product_id, quantity, total_amount_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id().as_str())
        .bind(order.product_id().as_str())
        .bind(i64::from(order.quantity()))
        .bind(order.total_amount().cents())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::AlreadyExists(order_id);
            }
            StoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn compare_and_set_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent writers on the same order
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"))
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(order_id))?;
        let mut order = Self::row_to_order(row)?;

        if order.status() != expected {
            return Err(StoreError::StatusConflict {
                order_id,
                expected,
                actual: order.status(),
            });
        }

        order.advance(next)?;
        order.touch();

        sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order_id.as_uuid())
            .bind(order.status().as_str())
            .bind(order.updated_at())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY created_at ASC, id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE customer_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE status = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
