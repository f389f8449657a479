//! Catalog Filters API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/filters?includeInactive= | GET | 全部筛选维度及数量（缓存） |
//! | /api/filters | DELETE | 清除筛选缓存（批量导入后调用） |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/filters", get(handler::get_filters).delete(handler::invalidate))
}
