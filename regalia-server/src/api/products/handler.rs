//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::validation::Validate;
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

fn product_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {} not found", id))
        .with_detail("id", id)
}

/// 重读一次，拿到同步后的反范式字段
async fn reload(repo: &ProductRepository, id: &str) -> AppResult<Product> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| product_not_found(id))
}

/// GET /api/products - 获取商品列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo.find_all(!query.include_inactive).await?;
    Ok(Json(products))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(reload(&repo, &id).await?))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    payload.validate()?;
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(payload).await?;

    let Some(id) = product.id.as_ref().map(|i| i.to_string()) else {
        return Ok(Json(product));
    };
    state.on_product_changed(&id, true).await;
    tracing::info!(product_id = %id, slug = %product.slug, "Product created");

    Ok(Json(reload(&repo, &id).await?))
}

/// PUT /api/products/:id - 更新商品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    payload.validate()?;
    let touches_relations = payload.touches_relations();
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.update(&id, payload).await?;

    state.on_product_changed(&id, touches_relations).await;

    if touches_relations {
        return Ok(Json(reload(&repo, &id).await?));
    }
    Ok(Json(product))
}

/// DELETE /api/products/:id - 删除商品
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.delete(&id).await?;
    state.on_product_changed(&id, false).await;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(product))
}

/// POST /api/products/:id/sync - 手动重算反范式字段
pub async fn sync(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    if !state.sync.sync_one(&id).await? {
        return Err(product_not_found(&id));
    }
    state.facets.invalidate();
    let repo = ProductRepository::new(state.db.clone());
    Ok(Json(reload(&repo, &id).await?))
}
