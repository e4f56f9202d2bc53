//! Inventory endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use medbill_core::validation::{validate_id_list, validate_search_query};
use medbill_core::{Page, MAX_PAGE_LIMIT, QUICK_SEARCH_LIMIT};

use crate::auth::Owner;
use crate::dto::{BulkDeleteRequest, ItemCreatedResponse, ItemListResponse, ItemRequest, ItemView, OkResponse};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ListQuery>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let search = validate_search_query(query.search.as_deref().unwrap_or(""))?;
    let page = Page::new(query.page, query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_LIMIT);

    let result = state.db.items().list(owner.id, &search, page).await?;
    Ok(Json(ItemListResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        total_price: result.total_price.to_decimal(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    let q = validate_search_query(query.q.as_deref().unwrap_or(""))?;
    let items = state.db.items().search(owner.id, &q, QUICK_SEARCH_LIMIT).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ItemCreatedResponse>), ApiError> {
    let input = req.validate()?;
    let item = state.db.items().create(owner.id, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemCreatedResponse {
            success: true,
            message: format!("{} saved successfully", item.item_name),
            item_name: item.item_name,
            id: item.id,
        }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<i64>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let input = req.validate()?;
    state.db.items().update(owner.id, id, &input).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn delete(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    state.db.items().delete(owner.id, id).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn bulk_delete(
    State(state): State<AppState>,
    owner: Owner,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    validate_id_list(&req.ids)?;
    let deleted = state.db.items().bulk_delete(owner.id, &req.ids).await?;
    Ok(Json(OkResponse {
        ok: true,
        deleted: Some(deleted),
    }))
}
