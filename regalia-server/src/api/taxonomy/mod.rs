//! Taxonomy API 模块
//!
//! 四个分类维度共用一套泛型处理器：
//!
//! | 前缀 | 实体 |
//! |------|------|
//! | /api/categories | [`Category`] |
//! | /api/rites | [`Rite`] |
//! | /api/obediences | [`Obedience`] |
//! | /api/degrees | [`DegreeOrder`] |
//!
//! 列表支持 `withProductCount`、`activeOnly`、`hideEmpty` 查询参数。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;
use crate::db::models::{Category, DegreeOrder, Obedience, Rite, TaxonomyEntity};

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/categories", routes::<Category>())
        .nest("/api/rites", routes::<Rite>())
        .nest("/api/obediences", routes::<Obedience>())
        .nest("/api/degrees", routes::<DegreeOrder>())
}

fn routes<T: TaxonomyEntity>() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list::<T>).post(handler::create::<T>))
        .route(
            "/{id}",
            get(handler::get_by_id::<T>)
                .put(handler::update::<T>)
                .delete(handler::delete::<T>),
        )
}
