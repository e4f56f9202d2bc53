//! # Bill Repository
//!
//! Bills, their lines, and the stock decrement that goes with a sale.
//!
//! ## Bill Creation (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── INSERT bills (number, customer, total, pending = 0, bill_date)    │
//! │   ├── for each line:                                                    │
//! │   │     ├── INSERT bill_items (name/price/gst frozen)                   │
//! │   │     └── UPDATE items SET quantity = MAX(0, quantity - n)            │
//! │   │           (only the owner's item; unknown ids are skipped)          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Lines are never edited afterwards, so billed margins are permanent.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medbill_core::{line_total, Bill, BillItem, CoreError, Money, OwnerId, TaxRate, ValidationError};

const BILL_COLUMNS: &str = "id, user_id, bill_number, customer_name, customer_mobile, \
     total_cents, pending_cents, bill_date, created_at";

/// A validated bill line waiting to be written.
#[derive(Debug, Clone)]
pub struct NewBillLine {
    pub item_id: Option<i64>,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub gst: TaxRate,
    pub uom: String,
}

impl NewBillLine {
    /// GST-inclusive line total. `None` on overflow.
    pub fn total(&self) -> Option<Money> {
        line_total(self.unit_price, self.quantity, self.gst)
    }
}

/// A validated bill waiting to be written.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub customer_name: String,
    pub customer_mobile: Option<String>,
    pub bill_date: NaiveDate,
    pub lines: Vec<NewBillLine>,
}

impl NewBill {
    /// Prices every line and enforces the bill-level rules.
    pub fn price(&self) -> Result<PricedBill<'_>, CoreError> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyBill);
        }

        let line_totals = self
            .lines
            .iter()
            .map(NewBillLine::total)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(too_large)?;
        let total = line_totals
            .iter()
            .try_fold(Money::zero(), |sum, line| sum.cents().checked_add(line.cents()).map(Money::from_cents))
            .ok_or_else(too_large)?;

        if !total.is_positive() {
            return Err(CoreError::NonPositiveBillTotal);
        }
        Ok(PricedBill {
            bill: self,
            line_totals,
            total,
        })
    }

    /// Sum of line totals. See [`NewBill::price`].
    pub fn total(&self) -> Result<Money, CoreError> {
        self.price().map(|priced| priced.total)
    }
}

fn too_large() -> CoreError {
    ValidationError::InvalidFormat {
        field: "items".to_string(),
        reason: "bill total is too large".to_string(),
    }
    .into()
}

/// A bill whose header total and line totals were computed together.
///
/// Only [`NewBill::price`] builds one, so the stored header always equals
/// the sum of the stored lines.
#[derive(Debug, Clone)]
pub struct PricedBill<'a> {
    bill: &'a NewBill,
    line_totals: Vec<Money>,
    total: Money,
}

impl PricedBill<'_> {
    pub fn total(&self) -> Money {
        self.total
    }

    fn lines(&self) -> impl Iterator<Item = (&NewBillLine, Money)> {
        self.bill.lines.iter().zip(self.line_totals.iter().copied())
    }
}

/// Filters for the bills list.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    /// Matches bill number, customer name or mobile.
    pub search: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A bill together with its lines.
#[derive(Debug, Clone)]
pub struct BillWithItems {
    pub bill: Bill,
    pub items: Vec<BillItem>,
}

#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Writes a bill, its lines and the stock decrements atomically.
    pub async fn create(&self, owner: OwnerId, priced: &PricedBill<'_>) -> DbResult<BillWithItems> {
        let bill = priced.bill;
        let total = priced.total;
        let bill_number = generate_bill_number(bill.bill_date);
        debug!(owner, bill_number = %bill_number, lines = bill.lines.len(), "Creating bill");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let bill_id = sqlx::query(
            "INSERT INTO bills (user_id, bill_number, customer_name, customer_mobile, \
             total_cents, pending_cents, bill_date) VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(owner)
        .bind(&bill_number)
        .bind(&bill.customer_name)
        .bind(&bill.customer_mobile)
        .bind(total.cents())
        .bind(bill.bill_date)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (line, line_total) in priced.lines() {
            // Only link lines to items the owner actually has
            let item_id: Option<i64> = match line.item_id {
                Some(id) => sqlx::query_scalar("SELECT id FROM items WHERE id = ? AND user_id = ?")
                    .bind(id)
                    .bind(owner)
                    .fetch_optional(&mut *tx)
                    .await?,
                None => None,
            };

            sqlx::query(
                "INSERT INTO bill_items (bill_id, item_id, item_name, quantity, unit_price_cents, \
                 gst_bps, total_cents, uom) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(bill_id)
            .bind(item_id)
            .bind(&line.item_name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.gst.bps() as i64)
            .bind(line_total.cents())
            .bind(&line.uom)
            .execute(&mut *tx)
            .await?;

            if let Some(item_id) = item_id {
                sqlx::query(
                    "UPDATE items SET quantity = MAX(0, quantity - ?), updated_at = CURRENT_TIMESTAMP \
                     WHERE id = ? AND user_id = ?",
                )
                .bind(line.quantity)
                .bind(item_id)
                .bind(owner)
                .execute(&mut *tx)
                .await?;
            }
        }

        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?");
        let created = sqlx::query_as::<_, Bill>(&sql)
            .bind(bill_id)
            .fetch_one(&mut *tx)
            .await?;
        let items = sqlx::query_as::<_, BillItem>(
            "SELECT id, bill_id, item_id, item_name, quantity, unit_price_cents, gst_bps, \
             total_cents, uom FROM bill_items WHERE bill_id = ? ORDER BY id",
        )
        .bind(bill_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(owner, bill_id, bill_number = %bill_number, total = %total, "Bill created");
        Ok(BillWithItems { bill: created, items })
    }

    /// Bills newest first, filtered by text and an inclusive date range.
    pub async fn list(&self, owner: OwnerId, filter: &BillFilter) -> DbResult<Vec<Bill>> {
        debug!(owner, search = %filter.search, "Listing bills");

        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE user_id = ?1 \
               AND (?2 = '' OR bill_number LIKE ?3 OR customer_name LIKE ?3 OR customer_mobile LIKE ?3) \
               AND (?4 IS NULL OR bill_date >= ?4) \
               AND (?5 IS NULL OR bill_date <= ?5) \
             ORDER BY created_at DESC, id DESC"
        );
        let bills = sqlx::query_as::<_, Bill>(&sql)
            .bind(owner)
            .bind(&filter.search)
            .bind(format!("%{}%", filter.search))
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&self.pool)
            .await?;

        Ok(bills)
    }

    pub async fn get(&self, owner: OwnerId, id: i64) -> DbResult<Option<BillWithItems>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ? AND user_id = ?");
        let Some(bill) = sqlx::query_as::<_, Bill>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, BillItem>(
            "SELECT id, bill_id, item_id, item_name, quantity, unit_price_cents, gst_bps, \
             total_cents, uom FROM bill_items WHERE bill_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(BillWithItems { bill, items }))
    }
}

/// Generates a bill number in the format `BL<YYYYMMDD>-<8 hex>`.
///
/// The date is the bill date; the suffix comes from a random UUID so two
/// tills issuing bills in the same millisecond cannot collide.
fn generate_bill_number(bill_date: NaiveDate) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("BL{}-{}", bill_date.format("%Y%m%d"), &suffix[..8].to_uppercase())
}
