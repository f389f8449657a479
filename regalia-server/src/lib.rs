//! Regalia Server - 共济会服饰目录服务
//!
//! # 架构概述
//!
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储商品与分类实体
//! - **目录聚合** (`catalog`): 反范式同步、筛选项聚合管线
//! - **结果缓存** (`services/cache`): 进程内有界 FIFO + TTL 缓存
//! - **HTTP API** (`api`): 筛选项接口与目录管理接口
//!
//! 数据流：
//!
//! ```text
//! 分类实体变更 → DenormSync 重算引用商品 → 清除筛选缓存
//!             → 下一次 GET /api/filters 重新聚合 → 缓存 (TTL)
//! ```
//!
//! # 模块结构
//!
//! ```text
//! regalia-server/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── catalog/       # 聚合管线、筛选项服务、同步器
//! ├── services/      # 缓存、HTTP 服务
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志、校验、slug
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use catalog::{DenormSync, FacetService};
pub use core::{Config, Server, ServerState};
pub use services::ResultCache;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 日志文件保留天数
const LOG_RETENTION_DAYS: u64 = 14;

/// 设置运行环境：.env、工作目录、日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir.as_deref().map(std::path::Path::new);
    init_logger_with_file(Some(&config.log_level), config.is_production(), log_dir);

    if let Some(dir) = log_dir
        && let Err(e) = cleanup_old_logs(dir, LOG_RETENTION_DAYS)
    {
        tracing::warn!(error = %e, "Failed to clean up old logs");
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____                   ___
   / __ \___  ____ _____ _/ (_)___ _
  / /_/ / _ \/ __ `/ __ `/ / / __ `/
 / _, _/  __/ /_/ / /_/ / / / /_/ /
/_/ |_|\___/\__, /\__,_/_/_/\__,_/
           /____/
    "#
    );
}
