//! Catalog Filters API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{FiltersQuery, FiltersResponse, InvalidateResponse};
use shared::util::now_millis;

/// GET /api/filters - 获取筛选项
pub async fn get_filters(
    State(state): State<ServerState>,
    Query(query): Query<FiltersQuery>,
) -> AppResult<Json<FiltersResponse>> {
    let (filters, from_cache) = state.facets.get_filters(query.include_inactive).await?;
    Ok(Json(FiltersResponse {
        filters: (*filters).clone(),
        from_cache,
    }))
}

/// DELETE /api/filters - 清除筛选缓存
pub async fn invalidate(State(state): State<ServerState>) -> Json<InvalidateResponse> {
    let invalidated = state.facets.invalidate();
    tracing::info!(invalidated, "Catalog filter cache cleared via API");
    Json(InvalidateResponse {
        invalidated,
        invalidated_at: now_millis(),
    })
}
