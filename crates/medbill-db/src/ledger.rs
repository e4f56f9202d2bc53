//! # Profit Ledger
//!
//! Turns stored inventory and bills into the dashboard [`ProfitSummary`],
//! writing expiry losses to the permanent ledger along the way.
//!
//! ## Summary Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  summary(owner, today)                                                 │
//! │       │                                                                 │
//! │       ├── 1. detect_expiry_losses ──── error? warn, keep going         │
//! │       │      expired + unevaluated items                               │
//! │       │        ├── loss > 0 → INSERT ... ON CONFLICT DO NOTHING        │
//! │       │        └── always   → expiry_checked = 1                       │
//! │       │                                                                 │
//! │       ├── 2. total_recorded_loss ───── error? warn, loss = 0           │
//! │       ├── 3. margin_lines ──────────── error? warn, billing = 0        │
//! │       ├── 4. revenue_totals ────────── error? return Err               │
//! │       ▼                                                                 │
//! │  ProfitSummary::compose(totals, billing, loss)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## At Most One Loss Per Item
//! `expiry_loss_history` carries `UNIQUE(user_id, item_id)` and the insert
//! is conditional. Two concurrent summaries racing on the same item both
//! succeed; exactly one of them writes the row.
//!
//! ## Evaluated Once
//! An expired item is evaluated exactly once. When its loss is zero (sold
//! out when first seen expired) it is marked and never reconsidered, even
//! if it is restocked later.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::item::ITEM_COLUMNS;
use medbill_core::ledger::{billing_profit, ExpiryDecision, MarginLine};
use medbill_core::{Item, Money, OwnerId, ProfitSummary, RevenueTotals};

// =============================================================================
// Store Seam
// =============================================================================

/// Storage operations the ledger needs.
///
/// [`SqliteLedgerStore`] is the only production implementation; tests swap
/// in stores that fail on demand.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Items with `expiry_date <= today` that have neither been evaluated
    /// nor have a ledger row.
    async fn expired_unevaluated_items(&self, owner: OwnerId, today: NaiveDate) -> DbResult<Vec<Item>>;

    /// Conditionally writes the loss row and marks the item evaluated.
    /// Returns `false` when a row already existed.
    async fn record_loss(&self, owner: OwnerId, item: &Item, loss: Money) -> DbResult<bool>;

    /// Marks an item evaluated without writing a loss.
    async fn mark_evaluated(&self, owner: OwnerId, item_id: i64) -> DbResult<()>;

    /// All-time sum of the owner's recorded losses.
    async fn total_recorded_loss(&self, owner: OwnerId) -> DbResult<Money>;

    /// Every billed line of the owner, joined to its item's current cost.
    async fn margin_lines(&self, owner: OwnerId) -> DbResult<Vec<MarginLine>>;

    async fn revenue_totals(&self, owner: OwnerId, today: NaiveDate) -> DbResult<RevenueTotals>;
}

// =============================================================================
// SQLite Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedgerStore { pool }
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn expired_unevaluated_items(&self, owner: OwnerId, today: NaiveDate) -> DbResult<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE user_id = ? \
               AND expiry_date IS NOT NULL AND expiry_date <= ? \
               AND expiry_checked = 0 \
               AND NOT EXISTS ( \
                 SELECT 1 FROM expiry_loss_history e \
                 WHERE e.user_id = items.user_id AND e.item_id = items.id) \
             ORDER BY id"
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(owner)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn record_loss(&self, owner: OwnerId, item: &Item, loss: Money) -> DbResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let inserted = sqlx::query(
            "INSERT INTO expiry_loss_history (user_id, item_id, item_name, loss_cents) \
             VALUES (?, ?, ?, ?) ON CONFLICT(user_id, item_id) DO NOTHING",
        )
        .bind(owner)
        .bind(item.id)
        .bind(&item.item_name)
        .bind(loss.cents())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        sqlx::query("UPDATE items SET expiry_checked = 1 WHERE id = ? AND user_id = ?")
            .bind(item.id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(inserted)
    }

    async fn mark_evaluated(&self, owner: OwnerId, item_id: i64) -> DbResult<()> {
        sqlx::query("UPDATE items SET expiry_checked = 1 WHERE id = ? AND user_id = ?")
            .bind(item_id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn total_recorded_loss(&self, owner: OwnerId) -> DbResult<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(loss_cents), 0) FROM expiry_loss_history WHERE user_id = ?",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(total))
    }

    async fn margin_lines(&self, owner: OwnerId) -> DbResult<Vec<MarginLine>> {
        let rows: Vec<(i64, Option<i64>, i64)> = sqlx::query_as(
            "SELECT bi.unit_price_cents, i.cost_price_cents, bi.quantity \
             FROM bill_items bi \
             JOIN bills b ON b.id = bi.bill_id \
             LEFT JOIN items i ON i.id = bi.item_id \
             WHERE b.user_id = ?",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(unit, cost, qty)| MarginLine::from_cents(unit, cost, qty))
            .collect())
    }

    async fn revenue_totals(&self, owner: OwnerId, today: NaiveDate) -> DbResult<RevenueTotals> {
        let (total, today_total, count, pending): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_cents), 0), \
                    COALESCE(SUM(CASE WHEN bill_date = ?1 THEN total_cents ELSE 0 END), 0), \
                    COUNT(*), \
                    COALESCE(SUM(pending_cents), 0) \
             FROM bills WHERE user_id = ?2",
        )
        .bind(today)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueTotals {
            total_revenue: Money::from_cents(total),
            today_revenue: Money::from_cents(today_total),
            total_bills: count,
            pending_amount: Money::from_cents(pending),
        })
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Counts from one detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionReport {
    /// Expired items looked at in this pass.
    pub evaluated: usize,
    /// New ledger rows written.
    pub recorded: usize,
    /// Items skipped because their loss could not be computed or written.
    /// They are retried next pass.
    pub failed: usize,
}

/// Profit computation over a [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct ProfitLedger<S> {
    store: S,
}

impl<S: LedgerStore> ProfitLedger<S> {
    pub fn new(store: S) -> Self {
        ProfitLedger { store }
    }

    /// Records losses for newly expired stock.
    ///
    /// Fails only if the expired items cannot be listed. An item whose loss
    /// overflows or whose write fails is logged and skipped.
    pub async fn detect_expiry_losses(&self, owner: OwnerId, today: NaiveDate) -> DbResult<DetectionReport> {
        let items = self.store.expired_unevaluated_items(owner, today).await?;
        let mut report = DetectionReport {
            evaluated: items.len(),
            ..Default::default()
        };

        for item in &items {
            let decision = ExpiryDecision::for_item(item.quantity, item.cost())
                .map_err(|e| DbError::Internal(e.to_string()));
            let outcome = match decision {
                Err(e) => Err(e),
                Ok(ExpiryDecision::RecordLoss(loss)) => {
                    self.store.record_loss(owner, item, loss).await.map(|inserted| {
                        if inserted {
                            info!(owner, item_id = item.id, loss = %loss, "Expiry loss recorded");
                        }
                        inserted
                    })
                }
                Ok(ExpiryDecision::NoLoss) => self.store.mark_evaluated(owner, item.id).await.map(|_| false),
            };

            match outcome {
                Ok(true) => report.recorded += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(owner, item_id = item.id, error = %e, "Expiry loss not recorded; skipping item");
                    report.failed += 1;
                }
            }
        }

        debug!(owner, ?report, "Expiry detection finished");
        Ok(report)
    }

    /// Builds the dashboard summary.
    ///
    /// Detection, the loss sum and the margin query fail open. Only a failed
    /// revenue query is returned as an error.
    pub async fn summary(&self, owner: OwnerId, today: NaiveDate) -> DbResult<ProfitSummary> {
        if let Err(e) = self.detect_expiry_losses(owner, today).await {
            warn!(owner, error = %e, "Expiry detection failed; using losses already recorded");
        }

        let loss = self.store.total_recorded_loss(owner).await.unwrap_or_else(|e| {
            warn!(owner, error = %e, "Expiry loss sum failed; defaulting to 0");
            Money::zero()
        });

        let billing = match self.store.margin_lines(owner).await {
            Ok(lines) => billing_profit(&lines).unwrap_or_else(|e| {
                warn!(owner, error = %e, "Billing profit out of range; defaulting to 0");
                rust_decimal::Decimal::ZERO
            }),
            Err(e) => {
                warn!(owner, error = %e, "Billing profit calculation failed; defaulting to 0");
                rust_decimal::Decimal::ZERO
            }
        };

        let totals = self.store.revenue_totals(owner, today).await?;

        Ok(ProfitSummary::compose(totals, billing, loss))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ItemInput, NewBill, NewBillLine};
    use crate::test_support::{db_with_owner, item_input};
    use crate::Database;
    use chrono::Duration;
    use medbill_core::TaxRate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn stock(code: &str, qty: i64, price: i64, cost: i64, expiry: Option<NaiveDate>) -> ItemInput {
        ItemInput {
            item_price: Money::from_cents(price),
            cost_price: Money::from_cents(cost),
            expiry_date: expiry,
            ..item_input(code, qty)
        }
    }

    async fn sell(db: &Database, owner: OwnerId, item: &Item, qty: i64) {
        let bill = NewBill {
            customer_name: "Walk-in".to_string(),
            customer_mobile: None,
            bill_date: today(),
            lines: vec![NewBillLine {
                item_id: Some(item.id),
                item_name: item.item_name.clone(),
                quantity: qty,
                unit_price: item.price(),
                gst: TaxRate::zero(),
                uom: item.uom.clone(),
            }],
        };
        db.bills().create(owner, &bill.price().unwrap()).await.unwrap();
    }

    async fn ledger_rows(db: &Database, owner: OwnerId) -> i64 {
        db.expiry_losses().count(owner).await.unwrap()
    }

    // -------------------------------------------------------------------------
    // SQLite-backed
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_margin_only_profit() {
        let (db, owner) = db_with_owner().await;
        let fresh = Some(today() + Duration::days(30));
        let item = db.items().create(owner, &stock("A", 100, 10_000, 6_000, fresh)).await.unwrap();
        sell(&db, owner, &item, 10).await;

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(400.00));
        assert_eq!(summary.total_revenue, dec!(1000.00));
        assert_eq!(summary.today_revenue, dec!(1000.00));
        assert_eq!(summary.total_bills, 1);
        assert_eq!(ledger_rows(&db, owner).await, 0);
    }

    #[tokio::test]
    async fn test_expired_stock_is_written_off_once() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        db.items().create(owner, &stock("B", 20, 8_000, 5_000, yesterday)).await.unwrap();

        let first = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(first.profit_amount, dec!(-1000.00));
        assert_eq!(ledger_rows(&db, owner).await, 1);

        let second = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(ledger_rows(&db, owner).await, 1);

        let records = db.expiry_losses().list(owner).await.unwrap();
        assert_eq!(records[0].loss_cents, 100_000);
        assert_eq!(records[0].item_name, "B");
    }

    #[tokio::test]
    async fn test_item_expiring_today_counts() {
        let (db, owner) = db_with_owner().await;
        db.items().create(owner, &stock("T", 2, 1_000, 500, Some(today()))).await.unwrap();

        let report = db.ledger().detect_expiry_losses(owner, today()).await.unwrap();
        assert_eq!(report, DetectionReport { evaluated: 1, recorded: 1, failed: 0 });
    }

    #[tokio::test]
    async fn test_recorded_loss_never_changes() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        let item = db.items().create(owner, &stock("M", 20, 8_000, 5_000, yesterday)).await.unwrap();
        db.ledger().summary(owner, today()).await.unwrap();

        // Restock at a new cost; the written-off amount stays
        db.items().update(owner, item.id, &stock("M", 90, 8_000, 7_000, yesterday)).await.unwrap();
        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-1000.00));

        // Deleting the item keeps its ledger row too
        db.items().delete(owner, item.id).await.unwrap();
        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-1000.00));
        assert_eq!(ledger_rows(&db, owner).await, 1);
    }

    #[tokio::test]
    async fn test_sold_out_expired_item_never_gains_a_loss() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        let item = db.items().create(owner, &stock("C", 0, 5_000, 3_000, yesterday)).await.unwrap();

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(0));

        db.items().update(owner, item.id, &stock("C", 40, 5_000, 3_000, yesterday)).await.unwrap();
        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(0));
        assert_eq!(ledger_rows(&db, owner).await, 0);
    }

    #[tokio::test]
    async fn test_billing_profit_minus_loss_goes_negative() {
        let (db, owner) = db_with_owner().await;
        let fresh = Some(today() + Duration::days(90));
        let yesterday = Some(today() - Duration::days(1));

        let sold = db.items().create(owner, &stock("S", 10, 3_000, 1_000, fresh)).await.unwrap();
        sell(&db, owner, &sold, 10).await;
        db.items().create(owner, &stock("E", 10, 15_000, 10_000, yesterday)).await.unwrap();

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-800.00));
    }

    #[tokio::test]
    async fn test_deleted_item_margin_uses_zero_cost() {
        let (db, owner) = db_with_owner().await;
        let item = db.items().create(owner, &stock("D", 5, 2_000, 1_500, None)).await.unwrap();
        sell(&db, owner, &item, 2).await;
        db.items().delete(owner, item.id).await.unwrap();

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(40.00));
    }

    #[tokio::test]
    async fn test_losses_are_owner_scoped() {
        let (db, owner) = db_with_owner().await;
        let other = crate::test_support::add_owner(&db, "other@shop.com").await;
        let yesterday = Some(today() - Duration::days(1));
        db.items().create(other, &stock("O", 3, 1_000, 1_000, yesterday)).await.unwrap();

        let mine = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(mine.profit_amount, dec!(0));
        assert_eq!(ledger_rows(&db, other).await, 0);

        let theirs = db.ledger().summary(other, today()).await.unwrap();
        assert_eq!(theirs.profit_amount, dec!(-30.00));
    }

    #[tokio::test]
    async fn test_concurrent_detection_writes_one_row() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        db.items().create(owner, &stock("R", 4, 1_000, 250, yesterday)).await.unwrap();

        let (ledger_a, ledger_b) = (db.ledger(), db.ledger());
        let (a, b) = tokio::join!(
            ledger_a.summary(owner, today()),
            ledger_b.summary(owner, today())
        );
        assert_eq!(a.unwrap().profit_amount, dec!(-10.00));
        assert_eq!(b.unwrap().profit_amount, dec!(-10.00));
        assert_eq!(ledger_rows(&db, owner).await, 1);
    }

    #[tokio::test]
    async fn test_conditional_insert_reports_existing_row() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        let item = db.items().create(owner, &stock("X", 1, 1_000, 500, yesterday)).await.unwrap();
        let store = SqliteLedgerStore::new(db.pool().clone());

        assert!(store.record_loss(owner, &item, Money::from_cents(500)).await.unwrap());
        assert!(!store.record_loss(owner, &item, Money::from_cents(999)).await.unwrap());
        assert_eq!(store.total_recorded_loss(owner).await.unwrap(), Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_unrepresentable_loss_is_skipped_and_retried() {
        let (db, owner) = db_with_owner().await;
        let yesterday = Some(today() - Duration::days(1));
        // Stored without going through request validation
        let huge = db
            .items()
            .create(owner, &stock("HUGE", 10_000_000_000_000, 2_000_000, 1_000_000, yesterday))
            .await
            .unwrap();
        db.items().create(owner, &stock("SMALL", 2, 1_000, 500, yesterday)).await.unwrap();

        let report = db.ledger().detect_expiry_losses(owner, today()).await.unwrap();
        assert_eq!(report, DetectionReport { evaluated: 2, recorded: 1, failed: 1 });

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-10.00));
        assert_eq!(ledger_rows(&db, owner).await, 1);

        // Not marked evaluated, so a corrected quantity is picked up later
        db.items()
            .update(owner, huge.id, &stock("HUGE", 3, 2_000_000, 1_000_000, yesterday))
            .await
            .unwrap();
        let report = db.ledger().detect_expiry_losses(owner, today()).await.unwrap();
        assert_eq!(report, DetectionReport { evaluated: 1, recorded: 1, failed: 0 });
        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-30010.00));
    }

    #[tokio::test]
    async fn test_unrepresentable_margin_defaults_billing_to_zero() {
        let (db, owner) = db_with_owner().await;
        let pricey = db.items().create(owner, &stock("GOLD", 1, 0, i64::MAX, None)).await.unwrap();

        let bill = NewBill {
            customer_name: "Walk-in".to_string(),
            customer_mobile: None,
            bill_date: today(),
            lines: vec![
                NewBillLine {
                    item_id: Some(pricey.id),
                    item_name: "GOLD".to_string(),
                    quantity: i64::MAX,
                    unit_price: Money::zero(),
                    gst: TaxRate::zero(),
                    uom: "PCS".to_string(),
                },
                NewBillLine {
                    item_id: None,
                    item_name: "Bandage".to_string(),
                    quantity: 1,
                    unit_price: Money::from_cents(5_000),
                    gst: TaxRate::zero(),
                    uom: "PCS".to_string(),
                },
            ],
        };
        db.bills().create(owner, &bill.price().unwrap()).await.unwrap();

        let summary = db.ledger().summary(owner, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(0));
        assert_eq!(summary.total_revenue, dec!(50.00));
        assert_eq!(summary.total_bills, 1);
    }

    // -------------------------------------------------------------------------
    // Failure handling
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct FlakyStore {
        fail_listing: bool,
        fail_writes: bool,
        fail_loss_sum: bool,
        fail_margins: bool,
        fail_revenue: bool,
        writes: AtomicUsize,
    }

    fn unavailable() -> DbError {
        DbError::QueryFailed("database is locked".to_string())
    }

    fn expired_item(id: i64) -> Item {
        let stamp = today().and_hms_opt(9, 0, 0).unwrap();
        Item {
            id,
            user_id: 1,
            item_code: format!("I{id}"),
            item_name: format!("Item {id}"),
            quantity: 2,
            item_price_cents: 1_000,
            cost_price_cents: 400,
            mrp_cents: 1_200,
            gst_bps: 0,
            uom: "PCS".to_string(),
            expiry_date: Some(today() - Duration::days(3)),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[async_trait]
    impl LedgerStore for FlakyStore {
        async fn expired_unevaluated_items(&self, _: OwnerId, _: NaiveDate) -> DbResult<Vec<Item>> {
            if self.fail_listing {
                return Err(unavailable());
            }
            Ok(vec![expired_item(1), expired_item(2)])
        }

        async fn record_loss(&self, _: OwnerId, _: &Item, _: Money) -> DbResult<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(unavailable());
            }
            Ok(true)
        }

        async fn mark_evaluated(&self, _: OwnerId, _: i64) -> DbResult<()> {
            Ok(())
        }

        async fn total_recorded_loss(&self, _: OwnerId) -> DbResult<Money> {
            if self.fail_loss_sum {
                return Err(unavailable());
            }
            Ok(Money::from_cents(5_000))
        }

        async fn margin_lines(&self, _: OwnerId) -> DbResult<Vec<MarginLine>> {
            if self.fail_margins {
                return Err(unavailable());
            }
            Ok(vec![MarginLine::from_cents(10_000, Some(6_000), 3)])
        }

        async fn revenue_totals(&self, _: OwnerId, _: NaiveDate) -> DbResult<RevenueTotals> {
            if self.fail_revenue {
                return Err(unavailable());
            }
            Ok(RevenueTotals {
                total_revenue: Money::from_cents(30_000),
                total_bills: 1,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_healthy_store_summary() {
        let ledger = ProfitLedger::new(FlakyStore::default());
        let summary = ledger.summary(1, today()).await.unwrap();
        // 120.00 billed margin - 50.00 recorded loss
        assert_eq!(summary.profit_amount, dec!(70.00));
    }

    #[tokio::test]
    async fn test_detection_failure_is_skipped() {
        let ledger = ProfitLedger::new(FlakyStore { fail_listing: true, ..Default::default() });
        assert!(ledger.detect_expiry_losses(1, today()).await.is_err());

        let summary = ledger.summary(1, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(70.00));
    }

    #[tokio::test]
    async fn test_failed_item_write_does_not_stop_the_pass() {
        let ledger = ProfitLedger::new(FlakyStore { fail_writes: true, ..Default::default() });

        let report = ledger.detect_expiry_losses(1, today()).await.unwrap();
        assert_eq!(report, DetectionReport { evaluated: 2, recorded: 0, failed: 2 });
        assert_eq!(ledger.store.writes.load(Ordering::SeqCst), 2);

        assert!(ledger.summary(1, today()).await.is_ok());
    }

    #[tokio::test]
    async fn test_margin_failure_defaults_billing_to_zero() {
        let ledger = ProfitLedger::new(FlakyStore { fail_margins: true, ..Default::default() });
        let summary = ledger.summary(1, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(-50.00));
    }

    #[tokio::test]
    async fn test_loss_sum_failure_defaults_loss_to_zero() {
        let ledger = ProfitLedger::new(FlakyStore { fail_loss_sum: true, ..Default::default() });
        let summary = ledger.summary(1, today()).await.unwrap();
        assert_eq!(summary.profit_amount, dec!(120.00));
    }

    #[tokio::test]
    async fn test_revenue_failure_is_surfaced() {
        let ledger = ProfitLedger::new(FlakyStore { fail_revenue: true, ..Default::default() });
        let err = ledger.summary(1, today()).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
