//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/health | GET | 简单健康检查 |
//! | /api/health/detailed | GET | 数据库与缓存状态 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "cache_entries": 2
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::SystemTime;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(detailed_health))
}

/// 简单健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 结果缓存当前条目数
    cache_entries: usize,
}

/// 详细健康检查响应
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    /// 运行时间 (秒)
    uptime_seconds: u64,
    checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    database: CheckResult,
    cache: CacheCheck,
}

#[derive(Serialize)]
pub struct CacheCheck {
    entries: usize,
    capacity: usize,
}

/// 单项检查结果
#[derive(Serialize)]
pub struct CheckResult {
    /// ok | error
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl CheckResult {
    fn ok_with_latency(latency_ms: u64) -> Self {
        Self {
            status: "ok",
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            latency_ms: None,
            message: Some(message.into()),
        }
    }
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        cache_entries: state.cache.len(),
    })
}

pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let db_start = std::time::Instant::now();
    let db_check = match state.db.health().await {
        Ok(()) => CheckResult::ok_with_latency(db_start.elapsed().as_millis() as u64),
        Err(e) => CheckResult::error(format!("Database error: {}", e)),
    };

    let all_ok = db_check.status == "ok";

    Json(DetailedHealthResponse {
        status: if all_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: get_uptime_seconds(),
        checks: HealthChecks {
            database: db_check,
            cache: CacheCheck {
                entries: state.cache.len(),
                capacity: state.cache.capacity(),
            },
        },
    })
}
