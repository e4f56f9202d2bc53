//! # Item Update History
//!
//! Append-only log of manual stock adjustments, newest first in reports.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::report::ReportFilter;
use medbill_core::{Item, ItemUpdate, OwnerId, Page, StockChange};

/// One page of the history report.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub rows: Vec<ItemUpdate>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// History rows newest first, filtered by item code/name and by the
    /// date of the change.
    pub async fn list(&self, owner: OwnerId, filter: &ReportFilter, page: Page) -> DbResult<HistoryPage> {
        debug!(owner, search = %filter.search, page = page.page, limit = page.limit, "Listing item history");

        let where_clause = "user_id = ?1 \
             AND (?2 = '' OR item_code LIKE ?3 OR item_name LIKE ?3) \
             AND (?4 IS NULL OR date(created_at) >= ?4) \
             AND (?5 IS NULL OR date(created_at) <= ?5)";
        let pattern = format!("%{}%", filter.search);

        let sql = format!(
            "SELECT id, item_id, item_code, item_name, change_type, quantity_changed, \
             available_qty, updated_qty, price_cents, created_at \
             FROM item_updates_history WHERE {where_clause} \
             ORDER BY created_at DESC, id DESC LIMIT ?6 OFFSET ?7"
        );
        let rows = sqlx::query_as::<_, ItemUpdate>(&sql)
            .bind(owner)
            .bind(&filter.search)
            .bind(&pattern)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("SELECT COUNT(*) FROM item_updates_history WHERE {where_clause}");
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(owner)
            .bind(&filter.search)
            .bind(&pattern)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(&self.pool)
            .await?;

        Ok(HistoryPage { rows, total })
    }
}

/// Writes the history row for `item` moving from `previous_qty` to its
/// current quantity. No-op when the quantity is unchanged.
pub(crate) async fn insert_stock_change(
    conn: &mut SqliteConnection,
    item: &Item,
    previous_qty: i64,
) -> DbResult<()> {
    let Some((change, amount)) = StockChange::between(previous_qty, item.quantity) else {
        return Ok(());
    };

    sqlx::query(
        "INSERT INTO item_updates_history (user_id, item_id, item_code, item_name, change_type, \
         quantity_changed, available_qty, updated_qty, price_cents) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.user_id)
    .bind(item.id)
    .bind(&item.item_code)
    .bind(&item.item_name)
    .bind(change)
    .bind(amount)
    .bind(previous_qty)
    .bind(item.quantity)
    .bind(item.item_price_cents)
    .execute(conn)
    .await?;

    Ok(())
}
