//! Admin API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/admin/resync | POST | 全量重算反范式字段并清除筛选缓存 |

use axum::{Json, Router, extract::State, routing::post};

use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::SyncReport;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/admin/resync", post(resync_all))
}

/// POST /api/admin/resync
pub async fn resync_all(State(state): State<ServerState>) -> AppResult<Json<SyncReport>> {
    let report = state.sync.resync_all().await?;
    state.facets.invalidate();
    Ok(Json(report))
}
