//! SurrealDB 聚合数据源

use async_trait::async_trait;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::pipeline::{AggregateSource, ProductMatch};
use crate::db::models::{ProductFacetRow, TaxonomyEntry, TaxonomyKind};
use crate::db::repository::{ProductRepository, find_entries};
use crate::utils::AppResult;

#[derive(Clone)]
pub struct SurrealSource {
    db: Surreal<Db>,
    products: ProductRepository,
}

impl SurrealSource {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            products: ProductRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl AggregateSource for SurrealSource {
    async fn scan_products(&self, matching: ProductMatch) -> AppResult<Vec<ProductFacetRow>> {
        Ok(self.products.scan_facet_rows(matching.active_only()).await?)
    }

    async fn taxonomy_entries(&self, kind: TaxonomyKind) -> AppResult<Vec<TaxonomyEntry>> {
        Ok(find_entries(&self.db, kind, false).await?)
    }
}
