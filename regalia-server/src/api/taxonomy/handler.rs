//! Taxonomy API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::core::ServerState;
use crate::db::models::TaxonomyEntity;
use crate::db::repository::TaxonomyRepository;
use crate::utils::AppResult;
use crate::utils::validation::Validate;
use shared::models::{TaxonomyListItem, TaxonomyListQuery};

/// GET /api/{kind} - 列表（可带商品数量）
pub async fn list<T: TaxonomyEntity>(
    State(state): State<ServerState>,
    Query(query): Query<TaxonomyListQuery>,
) -> AppResult<Json<Vec<TaxonomyListItem>>> {
    let items = state.facets.taxonomy_listing(T::KIND, &query).await?;
    Ok(Json(items))
}

/// GET /api/{kind}/:id - 获取单个实体
pub async fn get_by_id<T: TaxonomyEntity>(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<T>> {
    let repo = TaxonomyRepository::<T>::new(state.db.clone());
    let item = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| T::KIND.not_found(&id))?;
    Ok(Json(item))
}

/// POST /api/{kind} - 创建
///
/// 新实体还没有商品引用，不触发同步
pub async fn create<T: TaxonomyEntity>(
    State(state): State<ServerState>,
    Json(payload): Json<T::Create>,
) -> AppResult<Json<T>> {
    payload.validate()?;
    let repo = TaxonomyRepository::<T>::new(state.db.clone());
    let item = repo.create(payload).await?;
    tracing::info!(entity = %T::KIND, id = ?item.id().map(|i| i.to_string()), "Taxonomy entity created");
    Ok(Json(item))
}

/// PUT /api/{kind}/:id - 更新，之后重算引用它的商品
pub async fn update<T: TaxonomyEntity>(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<T::Update>,
) -> AppResult<Json<T>> {
    payload.validate()?;
    let repo = TaxonomyRepository::<T>::new(state.db.clone());
    let item = repo.update(&id, payload).await?;

    let record_id = TaxonomyRepository::<T>::record_id(&id)?.to_string();
    state.on_taxonomy_changed(T::KIND, &record_id).await;

    Ok(Json(item))
}

/// DELETE /api/{kind}/:id - 硬删除，之后重算引用它的商品
///
/// 商品上的引用保留，同步与聚合都会忽略已删除的实体
pub async fn delete<T: TaxonomyEntity>(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<T>> {
    let repo = TaxonomyRepository::<T>::new(state.db.clone());
    let item = repo.delete(&id).await?;

    let record_id = TaxonomyRepository::<T>::record_id(&id)?.to_string();
    state.on_taxonomy_changed(T::KIND, &record_id).await;

    Ok(Json(item))
}
