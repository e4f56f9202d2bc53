use axum::extract::{Query, State};
use axum::Json;

use medbill_core::{Page, MAX_PAGE_LIMIT};
use medbill_db::repository::ReportFilter;

use crate::auth::Owner;
use crate::dto::{DateRangeQuery, HistoryResponse, ItemView, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_HISTORY_PAGE_SIZE: u32 = 10;

fn report_filter(query: &DateRangeQuery) -> Result<ReportFilter, ApiError> {
    Ok(ReportFilter {
        search: query.search()?,
        start_date: query.start()?,
        end_date: query.end()?,
    })
}

/// Items created in the range, newest first.
pub async fn items(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    let filter = report_filter(&query)?;
    let items = state.db.reports().items_report(owner.id, &filter).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn items_history(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let filter = report_filter(&query)?;
    let page = Page::new(query.page, query.limit, DEFAULT_HISTORY_PAGE_SIZE, MAX_PAGE_LIMIT);

    let result = state.db.history().list(owner.id, &filter, page).await?;
    Ok(Json(HistoryResponse {
        data: result.rows.into_iter().map(Into::into).collect(),
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total: result.total,
            pages: page.page_count(result.total),
        },
    }))
}
