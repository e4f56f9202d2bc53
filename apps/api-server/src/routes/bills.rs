//! # Billing Endpoints
//!
//! ```text
//! POST /api/bills
//!   body ──► validate lines ──► NewBill::total() ──► BillRepository::create
//!                                   │                    (bill + lines + stock
//!                                   │                     decrements, one tx)
//!                                   └── empty / zero total ──► 400
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use medbill_db::repository::{BillFilter, NewBill};

use crate::auth::Owner;
use crate::dto::{BillCreatedResponse, BillDetailView, BillView, CreateBillRequest, DateRangeQuery};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillCreatedResponse>), ApiError> {
    let bill = NewBill {
        customer_name: req.customer_name()?,
        customer_mobile: req.customer_mobile(),
        bill_date: state.today(),
        lines: req
            .items
            .iter()
            .map(|line| line.validate())
            .collect::<Result<Vec<_>, _>>()?,
    };
    let priced = bill.price()?;
    let total = priced.total();

    let created = state.db.bills().create(owner.id, &priced).await?;

    Ok((
        StatusCode::CREATED,
        Json(BillCreatedResponse {
            id: created.bill.id,
            bill_number: created.bill.bill_number,
            total: total.to_decimal(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<BillView>>, ApiError> {
    let filter = BillFilter {
        search: query.search()?,
        start_date: query.start()?,
        end_date: query.end()?,
    };

    let bills = state.db.bills().list(owner.id, &filter).await?;
    Ok(Json(bills.into_iter().map(Into::into).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<i64>,
) -> Result<Json<BillDetailView>, ApiError> {
    let found = state
        .db
        .bills()
        .get(owner.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", id))?;

    Ok(Json(BillDetailView {
        bill: found.bill.into(),
        items: found.items.into_iter().map(Into::into).collect(),
    }))
}
