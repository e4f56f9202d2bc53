//! # Item Repository
//!
//! Inventory CRUD, scoped to the owning shop.
//!
//! ## Stock History
//! ```text
//! create(qty = 12)          ──► history: Added   12  (0 → 12)
//! update(qty 12 → 5)        ──► history: Reduced  7  (12 → 5)
//! update(qty 5 → 5, price)  ──► no history row
//! bill line (qty 2)         ──► quantity = MAX(0, quantity - 2), no history row
//! ```
//! The item write and its history row commit in one transaction.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::history::insert_stock_change;
use medbill_core::{Item, Money, OwnerId, Page, TaxRate};

pub(crate) const ITEM_COLUMNS: &str = "id, user_id, item_code, item_name, quantity, \
     item_price_cents, cost_price_cents, mrp_cents, gst_bps, uom, expiry_date, created_at, updated_at";

/// Validated field set for creating or fully updating an item.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub item_code: String,
    pub item_name: String,
    pub quantity: i64,
    pub item_price: Money,
    pub cost_price: Money,
    pub mrp: Money,
    pub gst: TaxRate,
    pub uom: String,
    pub expiry_date: Option<NaiveDate>,
}

/// One page of the inventory listing.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<Item>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    /// Σ sale price × quantity across all matching rows.
    pub total_price: Money,
}

/// Repository for inventory items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

fn like_pattern(query: &str) -> String {
    format!("%{}%", query)
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists items, newest first, optionally filtered on code or name.
    pub async fn list(&self, owner: OwnerId, query: &str, page: Page) -> DbResult<ItemPage> {
        debug!(owner, query = %query, page = page.page, limit = page.limit, "Listing items");

        let pattern = like_pattern(query);
        let filter = "user_id = ?1 AND (?2 = '' OR item_code LIKE ?3 OR item_name LIKE ?3)";

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {filter} ORDER BY id DESC LIMIT ?4 OFFSET ?5"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(owner)
            .bind(query)
            .bind(&pattern)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(item_price_cents * quantity), 0) FROM items WHERE {filter}"
        );
        let (total, total_price): (i64, i64) = sqlx::query_as(&sql)
            .bind(owner)
            .bind(query)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        Ok(ItemPage {
            items,
            total,
            total_price: Money::from_cents(total_price),
        })
    }

    /// Quick search for the billing screen, alphabetical.
    pub async fn search(&self, owner: OwnerId, query: &str, limit: u32) -> DbResult<Vec<Item>> {
        debug!(owner, query = %query, limit, "Searching items");

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE user_id = ? AND (item_code LIKE ? OR item_name LIKE ?) \
             ORDER BY item_name LIMIT ?"
        );
        let pattern = like_pattern(query);
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(owner)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn get(&self, owner: OwnerId, id: i64) -> DbResult<Option<Item>> {
        fetch_item(&mut *self.pool.acquire().await?, owner, id).await
    }

    /// Creates an item and, when it starts with stock, an `Added` history row.
    pub async fn create(&self, owner: OwnerId, input: &ItemInput) -> DbResult<Item> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO items (user_id, item_code, item_name, quantity, item_price_cents, \
             cost_price_cents, mrp_cents, gst_bps, uom, expiry_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner)
        .bind(&input.item_code)
        .bind(&input.item_name)
        .bind(input.quantity)
        .bind(input.item_price.cents())
        .bind(input.cost_price.cents())
        .bind(input.mrp.cents())
        .bind(input.gst.bps() as i64)
        .bind(&input.uom)
        .bind(input.expiry_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_code(e, &input.item_code))?;

        let id = result.last_insert_rowid();
        let item = fetch_item(&mut tx, owner, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        if item.quantity > 0 {
            insert_stock_change(&mut tx, &item, 0).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(owner, item_id = id, code = %item.item_code, "Item created");
        Ok(item)
    }

    /// Replaces an item's fields, recording a history row when quantity moves.
    pub async fn update(&self, owner: OwnerId, id: i64, input: &ItemInput) -> DbResult<Item> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let previous = fetch_item(&mut tx, owner, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        sqlx::query(
            "UPDATE items SET item_code = ?, item_name = ?, quantity = ?, item_price_cents = ?, \
             cost_price_cents = ?, mrp_cents = ?, gst_bps = ?, uom = ?, expiry_date = ?, \
             updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&input.item_code)
        .bind(&input.item_name)
        .bind(input.quantity)
        .bind(input.item_price.cents())
        .bind(input.cost_price.cents())
        .bind(input.mrp.cents())
        .bind(input.gst.bps() as i64)
        .bind(&input.uom)
        .bind(input.expiry_date)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_code(e, &input.item_code))?;

        let item = fetch_item(&mut tx, owner, id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        if item.quantity != previous.quantity {
            insert_stock_change(&mut tx, &item, previous.quantity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(owner, item_id = id, "Item updated");
        Ok(item)
    }

    pub async fn delete(&self, owner: OwnerId, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        info!(owner, item_id = id, "Item deleted");
        Ok(())
    }

    /// Deletes every listed item the owner has. Returns how many went.
    pub async fn bulk_delete(&self, owner: OwnerId, ids: &[i64]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM items WHERE user_id = ? AND id IN ({placeholders})");

        let mut query = sqlx::query(&sql).bind(owner);
        for id in ids {
            query = query.bind(*id);
        }
        let deleted = query.execute(&self.pool).await?.rows_affected();

        info!(owner, requested = ids.len(), deleted, "Items bulk deleted");
        Ok(deleted)
    }
}

pub(crate) async fn fetch_item(
    conn: &mut SqliteConnection,
    owner: OwnerId,
    id: i64,
) -> DbResult<Option<Item>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ? AND user_id = ?");
    let item = sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

fn duplicate_code(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("item_code", code),
        other => other,
    }
}
