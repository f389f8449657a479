//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`filters`] - 目录筛选项（聚合 + 缓存）
//! - [`taxonomy`] - 分类 / 仪式 / 总会 / 级位管理
//! - [`products`] - 商品管理
//! - [`admin`] - 运维接口

pub mod admin;
pub mod filters;
pub mod health;
pub mod products;
pub mod taxonomy;

// Re-export common types for handlers
pub use crate::utils::AppResult;
