//! # Order Repository
//!
//! Production orders and the stock they consume.
//!
//! ## Save Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── update only: touch the row (takes the write lock)                 │
//! │   │   read stored status P, UPDATE orders ... WHERE id = ?              │
//! │   │   concurrent saves wait here and see the status the winner wrote    │
//! │   │                                                                     │
//! │   ├── needs_deduction(P, S)?                                            │
//! │   │     yes → snapshot stock ON THIS TRANSACTION                        │
//! │   │           enforce? check_stock → shortfall aborts (nothing kept)    │
//! │   │           else     deduction_plan                                   │
//! │   │           quantity = MAX(0, quantity - N) per row + movement log    │
//! │   │                                                                     │
//! │   └── create only: INSERT order                                         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Moving an order back to quote or cancelled does not return stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::inventory::{apply_adjustment, load_snapshot};
use lanyard_core::inventory::{check_stock, deduction_plan, needs_deduction};
use lanyard_core::order::{CalculationSnapshot, Order, OrderItem, OrderSummary};
use lanyard_core::OrderStatus;

/// First OP number handed out on an empty database.
pub const FIRST_OP_NUMBER: u32 = 1001;

const SELECT_ORDERS: &str = r#"
    SELECT
        id, op_number, client_id, client_name, date, deadline, status,
        items_json, calculation_json, total_value, created_at, updated_at
    FROM orders
"#;

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    op_number: String,
    client_id: Option<String>,
    client_name: String,
    date: NaiveDate,
    deadline: Option<NaiveDate>,
    status: OrderStatus,
    items_json: String,
    calculation_json: String,
    total_value: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let items: Vec<OrderItem> = serde_json::from_str(&row.items_json)?;
        let calculation: CalculationSnapshot = serde_json::from_str(&row.calculation_json)?;
        let total_value = Decimal::from_str(&row.total_value).map_err(|e| {
            DbError::InvalidData(format!("order {} total_value: {}", row.id, e))
        })?;

        Ok(Order {
            id: row.id,
            client_id: row.client_id,
            client_name: row.client_name,
            op_number: row.op_number,
            date: row.date,
            deadline: row.deadline,
            status: row.status,
            items,
            calculation,
            total_value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Saves a new order.
    ///
    /// An order created straight into a production status consumes stock in
    /// the same transaction.
    ///
    /// ## Errors
    /// - `DbError::Stock` when `enforce_stock` is set and material is short;
    ///   the message lists every missing material and nothing is written
    /// - `DbError::UniqueViolation` on a reused OP number
    pub async fn create(&self, order: &Order, enforce_stock: bool) -> DbResult<()> {
        debug!(
            id = %order.id,
            op_number = %order.op_number,
            status = %order.status,
            "Creating order"
        );

        let items_json = serde_json::to_string(&order.items)?;
        let calculation_json = serde_json::to_string(&order.calculation)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, op_number, client_id, client_name, date, deadline, status,
                items_json, calculation_json, total_value, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.op_number)
        .bind(&order.client_id)
        .bind(&order.client_name)
        .bind(order.date)
        .bind(order.deadline)
        .bind(order.status)
        .bind(&items_json)
        .bind(&calculation_json)
        .bind(order.total_value.to_string())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        if needs_deduction(None, order.status) {
            reserve_materials(&mut tx, order, enforce_stock).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Saves changes to an existing order.
    ///
    /// The transition is judged from the stored status, read after the
    /// transaction holds the write lock. Two saves racing the same approval
    /// run one after the other; the second sees `approved` already stored
    /// and deducts nothing.
    ///
    /// ## Errors
    /// - `DbError::NotFound` for an unknown id
    /// - `DbError::Stock` as in [`create`](Self::create)
    pub async fn update(&self, order: &Order, enforce_stock: bool) -> DbResult<()> {
        debug!(id = %order.id, status = %order.status, "Updating order");

        let items_json = serde_json::to_string(&order.items)?;
        let calculation_json = serde_json::to_string(&order.calculation)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before it reads
        // the status; concurrent saves of the same order queue up here.
        let touched = sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
            .bind(&order.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        let previous: OrderStatus =
            sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?1")
                .bind(&order.id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            UPDATE orders SET
                client_id = ?2,
                client_name = ?3,
                deadline = ?4,
                status = ?5,
                items_json = ?6,
                calculation_json = ?7,
                total_value = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_id)
        .bind(&order.client_name)
        .bind(order.deadline)
        .bind(order.status)
        .bind(&items_json)
        .bind(&calculation_json)
        .bind(order.total_value.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if needs_deduction(Some(previous), order.status) {
            reserve_materials(&mut tx, order, enforce_stock).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDERS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Lists orders, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDERS} WHERE status = ?1 ORDER BY date DESC, created_at DESC"
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDERS} ORDER BY date DESC, created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Deletes an order. Consumed stock is not returned.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Dashboard counters: active orders by stage and revenue without
    /// cancelled orders. Critical stock comes from
    /// [`InventoryRepository::low_stock`](crate::InventoryRepository::low_stock).
    pub async fn summary(&self) -> DbResult<OrderSummary> {
        let rows: Vec<(OrderStatus, String)> =
            sqlx::query_as("SELECT status, total_value FROM orders")
                .fetch_all(&self.pool)
                .await?;

        let mut summary = OrderSummary::default();
        for (status, total_value) in rows {
            let total_value = Decimal::from_str(&total_value)
                .map_err(|e| DbError::InvalidData(format!("order total_value: {}", e)))?;
            summary.record(status, total_value);
        }

        debug!(active = summary.active, revenue = %summary.revenue, "Order summary");
        Ok(summary)
    }

    /// Next free OP number (`"1001"`, `"1002"`, ...).
    pub async fn next_op_number(&self) -> DbResult<String> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(CAST(op_number AS INTEGER)) FROM orders")
                .fetch_one(&self.pool)
                .await?;

        let next = match max {
            Some(n) if n >= FIRST_OP_NUMBER as i64 => n + 1,
            _ => FIRST_OP_NUMBER as i64,
        };
        Ok(next.to_string())
    }
}

/// Checks and deducts the materials of `order` on the open transaction.
async fn reserve_materials(
    conn: &mut SqliteConnection,
    order: &Order,
    enforce_stock: bool,
) -> DbResult<()> {
    let requirements = order.material_requirements();
    let stock = load_snapshot(conn).await?;

    let plan = if enforce_stock {
        check_stock(&requirements, &stock).map_err(|shortfall| {
            warn!(
                op_number = %order.op_number,
                shortages = shortfall.shortages.len(),
                "Order blocked by stock shortfall"
            );
            DbError::Stock(shortfall)
        })?
    } else {
        deduction_plan(&requirements, &stock)
    };

    let reason = format!("OP {}", order.op_number);
    for adjustment in &plan {
        debug!(
            item_id = %adjustment.item_id,
            material = %adjustment.material,
            amount = adjustment.amount,
            "Deducting stock"
        );
        apply_adjustment(conn, adjustment, &order.id, &reason).await?;
    }

    info!(op_number = %order.op_number, rows = plan.len(), "Materials deducted for order");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
