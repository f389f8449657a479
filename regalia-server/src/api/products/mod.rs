//! Product API 模块
//!
//! 创建和修改分类关系的更新会触发该商品的反范式重算；
//! 所有写操作都会清除筛选缓存。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        // 手动重算单个商品
        .route("/{id}/sync", post(handler::sync))
}
