//! # Inventory Repository
//!
//! Stock rows, their relative adjustments, and the movement log.
//!
//! ## Relative Updates Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, compute, write back                               │
//! │     SELECT quantity ... ; UPDATE ... SET quantity = 61             │
//! │     (a concurrent save in between is silently lost)                │
//! │                                                                     │
//! │  ✅ CORRECT: one relative statement, floored                       │
//! │     UPDATE ... SET quantity = MAX(0, quantity - 189)               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `update` never touches `quantity`; stock moves only through `adjust` and
//! `deduct`, and each move is logged in `stock_movements`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lanyard_core::inventory::{
    InventoryItem, InventorySnapshot, StockAdjustment, StockLookup, StockMatch,
};
use lanyard_core::{RollWidth, TapeWidth};

const SELECT_ITEMS: &str = r#"
    SELECT id, name, category, quantity, unit, min_stock, location
    FROM inventory_items
"#;

/// One logged change to a stock row.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub inventory_item_id: String,
    pub order_id: Option<String>,
    /// Requested change; the stored quantity is floored at zero.
    pub delta: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Inserts a stock row. Its opening quantity is logged as a movement.
    pub async fn insert(&self, item: &InventoryItem) -> DbResult<InventoryItem> {
        debug!(id = %item.id, name = %item.name, "Inserting inventory item");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, category, quantity, unit, min_stock, location,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.category)
        .bind(item.quantity.max(0.0))
        .bind(&item.unit)
        .bind(item.min_stock)
        .bind(&item.location)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if item.quantity > 0.0 {
            record_movement(&mut tx, &item.id, None, item.quantity, "opening balance").await?;
        }

        tx.commit().await?;
        Ok(item.clone())
    }

    /// Updates descriptive fields. Quantity is left alone.
    pub async fn update(&self, item: &InventoryItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating inventory item");

        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?2,
                category = ?3,
                unit = ?4,
                min_stock = ?5,
                location = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.category)
        .bind(&item.unit)
        .bind(item.min_stock)
        .bind(&item.location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", &item.id));
        }

        Ok(())
    }

    /// Deletes a stock row and its movement log.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting inventory item");

        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }

    /// Gets a stock row by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!("{SELECT_ITEMS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists every stock row in insertion order.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let mut conn = self.pool.acquire().await?;
        let items = fetch_items(&mut conn).await?;
        Ok(items)
    }

    /// Rows at or below their alert threshold.
    pub async fn low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "{SELECT_ITEMS} WHERE quantity <= min_stock ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts stock rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Current stock as a matchable snapshot.
    pub async fn snapshot(&self) -> DbResult<InventorySnapshot> {
        let mut conn = self.pool.acquire().await?;
        load_snapshot(&mut conn).await
    }

    pub async fn find_tape_stock(&self, width: TapeWidth) -> DbResult<Option<StockMatch>> {
        Ok(self.snapshot().await?.find_tape_stock(width))
    }

    pub async fn find_paper_stock(&self, roll: RollWidth) -> DbResult<Option<StockMatch>> {
        Ok(self.snapshot().await?.find_paper_stock(roll))
    }

    pub async fn find_finishing_stock(&self, name: &str) -> DbResult<Option<StockMatch>> {
        Ok(self.snapshot().await?.find_finishing_stock(name))
    }

    /// Adds `delta` to a row (negative to write off), floored at zero.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // 500 m of 20mm tape arrived
    /// db.inventory().adjust(&tape_id, 500.0, "purchase").await?;
    /// ```
    pub async fn adjust(&self, id: &str, delta: f64, reason: &str) -> DbResult<()> {
        debug!(id = %id, delta, reason, "Adjusting stock");

        let mut tx = self.pool.begin().await?;
        apply_delta(&mut tx, id, delta).await?;
        record_movement(&mut tx, id, None, delta, reason).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Subtracts `amount` from a row, floored at zero.
    pub async fn deduct(&self, id: &str, amount: f64) -> DbResult<()> {
        self.adjust(id, -amount, "manual deduction").await
    }

    /// Movement log of one row, newest first.
    pub async fn movements(&self, id: &str) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, inventory_item_id, order_id, delta, reason, created_at
            FROM stock_movements
            WHERE inventory_item_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Shared with the order transaction
// =============================================================================

async fn fetch_items(conn: &mut SqliteConnection) -> DbResult<Vec<InventoryItem>> {
    let items = sqlx::query_as::<_, InventoryItem>(&format!("{SELECT_ITEMS} ORDER BY rowid"))
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

/// Reads every stock row on `conn` (inside a transaction when called from
/// the order repository).
pub(crate) async fn load_snapshot(conn: &mut SqliteConnection) -> DbResult<InventorySnapshot> {
    Ok(InventorySnapshot::new(fetch_items(conn).await?))
}

/// Applies one planned deduction for an order and logs it.
pub(crate) async fn apply_adjustment(
    conn: &mut SqliteConnection,
    adjustment: &StockAdjustment,
    order_id: &str,
    reason: &str,
) -> DbResult<()> {
    apply_delta(conn, &adjustment.item_id, -adjustment.amount).await?;
    record_movement(conn, &adjustment.item_id, Some(order_id), -adjustment.amount, reason).await
}

async fn apply_delta(conn: &mut SqliteConnection, id: &str, delta: f64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET
            quantity = MAX(0, quantity + ?2),
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("InventoryItem", id));
    }

    Ok(())
}

async fn record_movement(
    conn: &mut SqliteConnection,
    item_id: &str,
    order_id: Option<&str>,
    delta: f64,
    reason: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, inventory_item_id, order_id, delta, reason, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(order_id)
    .bind(delta)
    .bind(reason)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Generates a new inventory item ID.
pub fn generate_inventory_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
