//! 目录聚合
//!
//! - [`pipeline`] - 类型化聚合管线与数据源 trait
//! - [`source`] - SurrealDB 数据源
//! - [`facets`] - 筛选项服务（并发维度计算 + 缓存）
//! - [`sync`] - 反范式字段同步
//! - [`reconcile`] - 定时对账

pub mod facets;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod sync;

#[cfg(test)]
pub(crate) mod fixtures;

pub use facets::FacetService;
pub use pipeline::{AggregateSource, Bucket, Pipeline, PriceStats, ProductField, ProductMatch, SortKey};
pub use reconcile::Reconciler;
pub use source::SurrealSource;
pub use sync::DenormSync;
