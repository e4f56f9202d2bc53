//! # Report Repository
//!
//! Read-only aggregates for the dashboard charts and the reports screen.
//! Every query is scoped to one owner and takes `today` from the caller.

use chrono::{Duration, Months, NaiveDate};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::item::ITEM_COLUMNS;
use medbill_core::{Item, OwnerId, REVENUE_GRAPH_DAYS};

/// Billed revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue_cents: i64,
}

/// Units and revenue for one item name over the reporting window.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TopItem {
    pub item_name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Text and created-date filters shared by the items and history reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub search: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Daily revenue over the last 30 days (today inclusive), oldest first.
    /// Days without bills are omitted.
    pub async fn revenue_graph(&self, owner: OwnerId, today: NaiveDate) -> DbResult<Vec<RevenuePoint>> {
        let since = today - Duration::days(REVENUE_GRAPH_DAYS - 1);
        debug!(owner, since = %since, "Building revenue graph");

        let points = sqlx::query_as::<_, RevenuePoint>(
            "SELECT bill_date AS date, SUM(total_cents) AS revenue_cents FROM bills \
             WHERE user_id = ? AND bill_date >= ? AND bill_date <= ? \
             GROUP BY bill_date ORDER BY bill_date ASC",
        )
        .bind(owner)
        .bind(since)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }

    /// Best sellers by units over the last month, grouped by billed name.
    pub async fn top_items(&self, owner: OwnerId, today: NaiveDate, limit: u32) -> DbResult<Vec<TopItem>> {
        let since = today.checked_sub_months(Months::new(1)).unwrap_or(today);
        debug!(owner, since = %since, limit, "Loading top items");

        let items = sqlx::query_as::<_, TopItem>(
            "SELECT bi.item_name AS item_name, SUM(bi.quantity) AS quantity, \
                    SUM(bi.total_cents) AS revenue_cents \
             FROM bill_items bi JOIN bills b ON b.id = bi.bill_id \
             WHERE b.user_id = ? AND b.bill_date >= ? AND b.bill_date <= ? \
             GROUP BY bi.item_name \
             ORDER BY quantity DESC, revenue_cents DESC, bi.item_name ASC \
             LIMIT ?",
        )
        .bind(owner)
        .bind(since)
        .bind(today)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inventory rows filtered by text and by the date they were added,
    /// newest first.
    pub async fn items_report(&self, owner: OwnerId, filter: &ReportFilter) -> DbResult<Vec<Item>> {
        debug!(owner, search = %filter.search, "Building items report");

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE user_id = ?1 \
               AND (?2 = '' OR item_code LIKE ?3 OR item_name LIKE ?3) \
               AND (?4 IS NULL OR date(created_at) >= ?4) \
               AND (?5 IS NULL OR date(created_at) <= ?5) \
             ORDER BY created_at DESC, id DESC"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(owner)
            .bind(&filter.search)
            .bind(format!("%{}%", filter.search))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{NewBill, NewBillLine};
    use crate::test_support::{db_with_owner, item_input};
    use crate::Database;
    use medbill_core::{Money, TaxRate};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    async fn bill(db: &Database, owner: OwnerId, date: NaiveDate, name: &str, qty: i64, price: i64) {
        let new_bill = NewBill {
            customer_name: "Walk-in".to_string(),
            customer_mobile: None,
            bill_date: date,
            lines: vec![NewBillLine {
                item_id: None,
                item_name: name.to_string(),
                quantity: qty,
                unit_price: Money::from_cents(price),
                gst: TaxRate::zero(),
                uom: "PCS".to_string(),
            }],
        };
        db.bills().create(owner, &new_bill.price().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_revenue_graph_window() {
        let (db, owner) = db_with_owner().await;
        let today = day(6, 30);

        bill(&db, owner, day(5, 31), "Too old", 1, 9_999).await;
        bill(&db, owner, day(6, 1), "First day", 1, 1_000).await;
        bill(&db, owner, day(6, 1), "First day", 2, 1_000).await;
        bill(&db, owner, today, "Today", 1, 500).await;

        let points = db.reports().revenue_graph(owner, today).await.unwrap();
        assert_eq!(
            points,
            vec![
                RevenuePoint { date: day(6, 1), revenue_cents: 3_000 },
                RevenuePoint { date: today, revenue_cents: 500 },
            ]
        );
    }

    #[tokio::test]
    async fn test_top_items_ranked_by_units() {
        let (db, owner) = db_with_owner().await;
        let today = day(6, 30);

        bill(&db, owner, day(6, 10), "Cetirizine", 2, 300).await;
        bill(&db, owner, day(6, 12), "Paracetamol", 5, 100).await;
        bill(&db, owner, day(6, 20), "Cetirizine", 1, 300).await;
        bill(&db, owner, day(4, 1), "Paracetamol", 50, 100).await;

        let top = db.reports().top_items(owner, today, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item_name, "Paracetamol");
        assert_eq!(top[0].quantity, 5);
        assert_eq!(top[1].item_name, "Cetirizine");
        assert_eq!(top[1].quantity, 3);
        assert_eq!(top[1].revenue_cents, 900);

        let only_one = db.reports().top_items(owner, today, 1).await.unwrap();
        assert_eq!(only_one.len(), 1);
    }

    #[tokio::test]
    async fn test_items_report_search() {
        let (db, owner) = db_with_owner().await;
        db.items().create(owner, &item_input("AMOX-250", 10)).await.unwrap();
        db.items().create(owner, &item_input("ORS-1", 4)).await.unwrap();

        let all = db.reports().items_report(owner, &ReportFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = db
            .reports()
            .items_report(owner, &ReportFilter { search: "amox".to_string(), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item_code, "AMOX-250");

        // Created "now", so a range far in the past excludes everything
        let past = db
            .reports()
            .items_report(
                owner,
                &ReportFilter {
                    start_date: Some(day(1, 1)),
                    end_date: Some(day(1, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(past.is_empty());
    }
}
