//! # JSON Bodies
//!
//! Request and response shapes for the web frontend. Money goes over the wire
//! as JSON numbers in rupees and is stored as integer paise.
//!
//! Request amounts are parsed as [`Decimal`] so `12.345` is rounded half-up to
//! the paisa by validation, never truncated by a float cast.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use medbill_core::validation::{
    validate_amount, validate_customer_name, validate_gst_percent, validate_item_code,
    validate_item_name, validate_sold_quantity, validate_stock_quantity, validate_uom,
};
use medbill_core::{Bill, BillItem, ExpiryLossRecord, Item, ItemUpdate, Money, StockChange, User};
use medbill_db::repository::{ItemInput, NewBillLine, RevenuePoint, TopItem};

use crate::error::ApiError;

fn rupees(cents: i64) -> Decimal {
    Money::from_cents(cents).to_decimal()
}

fn percent(bps: i64) -> Decimal {
    Decimal::new(bps, 2)
}

// =============================================================================
// Query strings
// =============================================================================

/// `?search=&start_date=&end_date=` used by bills and reports.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl DateRangeQuery {
    pub fn search(&self) -> Result<String, ApiError> {
        Ok(medbill_core::validation::validate_search_query(
            self.search.as_deref().unwrap_or(""),
        )?)
    }

    pub fn start(&self) -> Result<Option<NaiveDate>, ApiError> {
        parse_date("start_date", self.start_date.as_deref())
    }

    pub fn end(&self) -> Result<Option<NaiveDate>, ApiError> {
        parse_date("end_date", self.end_date.as_deref())
    }
}

/// Empty strings count as "not given"; the frontend sends them for cleared pickers.
pub fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{} must be a YYYY-MM-DD date", field))),
    }
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub item_code: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub item_price: Decimal,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub mrp: Decimal,
    #[serde(default)]
    pub gst: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl ItemRequest {
    pub fn validate(&self) -> Result<ItemInput, ApiError> {
        validate_stock_quantity(self.quantity)?;
        Ok(ItemInput {
            item_code: validate_item_code(&self.item_code)?,
            item_name: validate_item_name(&self.item_name)?,
            quantity: self.quantity,
            item_price: validate_amount("item_price", self.item_price)?,
            cost_price: validate_amount("cost_price", self.cost_price)?,
            mrp: validate_amount("mrp", self.mrp)?,
            gst: validate_gst_percent(self.gst)?,
            uom: validate_uom(self.uom.as_deref())?,
            expiry_date: parse_date("expiry_date", self.expiry_date.as_deref())?,
        })
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ItemView {
    #[ts(type = "number")]
    pub id: i64,
    pub item_code: String,
    pub item_name: String,
    #[ts(type = "number")]
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub item_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub cost_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub mrp: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub gst: Decimal,
    pub uom: String,
    #[ts(type = "string | null")]
    pub expiry_date: Option<NaiveDate>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        ItemView {
            id: item.id,
            item_price: rupees(item.item_price_cents),
            cost_price: rupees(item.cost_price_cents),
            mrp: rupees(item.mrp_cents),
            gst: percent(item.gst_bps),
            item_code: item.item_code,
            item_name: item.item_name,
            quantity: item.quantity,
            uom: item.uom,
            expiry_date: item.expiry_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemListResponse {
    pub items: Vec<ItemView>,
    #[ts(type = "number")]
    pub total: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemCreatedResponse {
    pub success: bool,
    pub message: String,
    pub item_name: String,
    #[ts(type = "number")]
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | undefined")]
    pub deleted: Option<u64>,
}

impl OkResponse {
    pub fn ok() -> Self {
        OkResponse { ok: true, deleted: None }
    }
}

// =============================================================================
// Bills
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct BillLineRequest {
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub gst: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
}

impl BillLineRequest {
    pub fn validate(&self) -> Result<NewBillLine, ApiError> {
        validate_sold_quantity(self.quantity)?;
        Ok(NewBillLine {
            item_id: self.item_id,
            item_name: validate_item_name(&self.item_name)?,
            quantity: self.quantity,
            unit_price: validate_amount("unit_price", self.unit_price)?,
            gst: validate_gst_percent(self.gst)?,
            uom: validate_uom(self.uom.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_mobile: Option<String>,
    #[serde(default)]
    pub items: Vec<BillLineRequest>,
}

impl CreateBillRequest {
    pub fn customer_name(&self) -> Result<String, ApiError> {
        Ok(validate_customer_name(&self.customer_name)?)
    }

    pub fn customer_mobile(&self) -> Option<String> {
        self.customer_mobile
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BillCreatedResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub bill_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total: Decimal,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BillView {
    #[ts(type = "number")]
    pub id: i64,
    pub bill_number: String,
    pub customer_name: String,
    pub customer_mobile: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub pending_amount: Decimal,
    #[ts(type = "string")]
    pub bill_date: NaiveDate,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

impl From<Bill> for BillView {
    fn from(bill: Bill) -> Self {
        BillView {
            id: bill.id,
            total_amount: rupees(bill.total_cents),
            pending_amount: rupees(bill.pending_cents),
            bill_number: bill.bill_number,
            customer_name: bill.customer_name,
            customer_mobile: bill.customer_mobile,
            bill_date: bill.bill_date,
            created_at: bill.created_at,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BillItemView {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub bill_id: i64,
    #[ts(type = "number | null")]
    pub item_id: Option<i64>,
    pub item_name: String,
    #[ts(type = "number")]
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total: Decimal,
    pub uom: String,
}

impl From<BillItem> for BillItemView {
    fn from(line: BillItem) -> Self {
        BillItemView {
            id: line.id,
            bill_id: line.bill_id,
            item_id: line.item_id,
            unit_price: rupees(line.unit_price_cents),
            gst: percent(line.gst_bps),
            total: rupees(line.total_cents),
            item_name: line.item_name,
            quantity: line.quantity,
            uom: line.uom,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BillDetailView {
    #[serde(flatten)]
    pub bill: BillView,
    pub items: Vec<BillItemView>,
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RevenuePointView {
    #[ts(type = "string")]
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub amount: Decimal,
}

impl From<RevenuePoint> for RevenuePointView {
    fn from(point: RevenuePoint) -> Self {
        RevenuePointView {
            date: point.date,
            amount: rupees(point.revenue_cents),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TopItemView {
    pub item_name: String,
    #[ts(type = "number")]
    pub qty: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total: Decimal,
}

impl From<TopItem> for TopItemView {
    fn from(item: TopItem) -> Self {
        TopItemView {
            qty: item.quantity,
            total: rupees(item.revenue_cents),
            item_name: item.item_name,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ExpiryLossView {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub item_id: i64,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub loss_amount: Decimal,
    #[ts(type = "string")]
    pub recorded_at: NaiveDateTime,
}

impl From<ExpiryLossRecord> for ExpiryLossView {
    fn from(record: ExpiryLossRecord) -> Self {
        ExpiryLossView {
            id: record.id,
            item_id: record.item_id,
            loss_amount: rupees(record.loss_cents),
            item_name: record.item_name,
            recorded_at: record.recorded_at,
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ItemUpdateView {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number | null")]
    pub item_id: Option<i64>,
    pub item_code: String,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub sale_price: Decimal,
    #[ts(type = "number")]
    pub available_qty: i64,
    #[ts(type = "number")]
    pub updated_qty: i64,
    #[ts(type = "number")]
    pub difference: i64,
    pub action_type: StockChange,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

impl From<ItemUpdate> for ItemUpdateView {
    fn from(row: ItemUpdate) -> Self {
        ItemUpdateView {
            id: row.id,
            item_id: row.item_id,
            sale_price: rupees(row.price_cents),
            available_qty: row.available_qty,
            updated_qty: row.updated_qty,
            difference: row.quantity_changed,
            action_type: row.change_type,
            created_at: row.created_at,
            item_code: row.item_code,
            item_name: row.item_name,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[ts(type = "number")]
    pub total: i64,
    #[ts(type = "number")]
    pub pages: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct HistoryResponse {
    pub data: Vec<ItemUpdateView>,
    pub pagination: Pagination,
}

// =============================================================================
// Auth & subscription
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub shop_name: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RegisterResponse {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "string")]
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct UserView {
    #[ts(type = "number")]
    pub id: i64,
    pub email: String,
    pub shop_name: String,
    #[ts(type = "string | null")]
    pub subscription_expiry: Option<NaiveDate>,
    #[serde(rename = "subscriptionActive")]
    pub subscription_active: bool,
}

impl UserView {
    pub fn new(user: User, today: NaiveDate) -> Self {
        UserView {
            id: user.id,
            subscription_active: user.subscription_active(today),
            email: user.email,
            shop_name: user.shop_name,
            subscription_expiry: user.subscription_expiry,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    #[serde(default)]
    pub plan_months: i64,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RechargeResponse {
    pub ok: bool,
    #[ts(type = "string")]
    pub expiry: NaiveDate,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    #[ts(type = "string")]
    pub message: &'static str,
}
