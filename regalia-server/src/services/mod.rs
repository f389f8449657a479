//! 服务层
//!
//! - [`cache`] - 进程内结果缓存
//! - [`http`] - HTTP 服务（axum）

pub mod cache;
pub mod http;

pub use cache::ResultCache;
pub use http::HttpService;
