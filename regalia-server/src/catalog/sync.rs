//! Denormalization Synchronizer
//!
//! 维护商品上的四个反范式字段（lodge_types / rite_codes / obedience_codes /
//! category_slugs），它们等于当前引用实体对应属性的并集。
//!
//! - `sync_one`: 幂等；商品不存在时记日志并返回 `Ok(false)`
//! - `sync_many`: 分批执行，单个失败不影响其他，只计数
//! - `resync_for_entity`: 分类实体变更后重算所有引用它的商品

use std::time::Instant;

use futures::future::join_all;

use crate::db::models::{
    Category, DegreeOrder, DenormalizedFields, Obedience, Rite, TaxonomyKind,
};
use crate::db::repository::{ProductRepository, TaxonomyRepository};
use crate::utils::AppResult;
use shared::models::SyncReport;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// 默认批大小
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Clone)]
pub struct DenormSync {
    products: ProductRepository,
    categories: TaxonomyRepository<Category>,
    rites: TaxonomyRepository<Rite>,
    obediences: TaxonomyRepository<Obedience>,
    degrees: TaxonomyRepository<DegreeOrder>,
    batch_size: usize,
}

impl DenormSync {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            products: ProductRepository::new(db.clone()),
            categories: TaxonomyRepository::new(db.clone()),
            rites: TaxonomyRepository::new(db.clone()),
            obediences: TaxonomyRepository::new(db.clone()),
            degrees: TaxonomyRepository::new(db),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// 重算单个商品。返回 false 表示商品不存在。
    ///
    /// 已删除的实体不再贡献任何值；停用的实体仍然贡献。
    pub async fn sync_one(&self, product_id: &str) -> AppResult<bool> {
        let Some(product) = self.products.find_by_id(product_id).await? else {
            tracing::warn!(product_id = %product_id, "Product not found, skipping denormalization sync");
            return Ok(false);
        };
        let Some(record_id) = product.id.clone() else {
            return Ok(false);
        };

        let (rites, obediences, degrees, categories) = tokio::try_join!(
            self.rites.find_by_ids(&product.rites),
            self.obediences.find_by_ids(&product.obediences),
            self.degrees.find_by_ids(&product.degree_orders),
            self.categories.find_by_ids(&product.categories),
        )?;

        let fields = DenormalizedFields::collect(&rites, &obediences, &degrees, &categories);
        if fields.matches(&product) {
            tracing::trace!(product_id = %product_id, "Denormalized fields already up to date");
            return Ok(true);
        }

        self.products.write_denormalized(&record_id, &fields).await?;
        tracing::debug!(
            product_id = %product_id,
            lodge_types = ?fields.lodge_types,
            rite_codes = ?fields.rite_codes,
            "Denormalized fields updated"
        );
        Ok(true)
    }

    /// 逐个重算，按 `batch_size` 分批并发，不抛错
    pub async fn sync_many(&self, product_ids: &[String]) -> SyncReport {
        let mut report = SyncReport {
            total: product_ids.len(),
            ..Default::default()
        };

        for batch in product_ids.chunks(self.batch_size) {
            let results = join_all(batch.iter().map(|id| self.sync_one(id))).await;
            for (id, result) in batch.iter().zip(results) {
                match result {
                    Ok(true) => report.successes += 1,
                    Ok(false) => report.failures += 1,
                    Err(e) => {
                        tracing::error!(product_id = %id, error = %e, "Denormalization sync failed");
                        report.failures += 1;
                    }
                }
            }
        }
        report
    }

    /// 分类实体更新或删除后调用
    pub async fn resync_for_entity(&self, kind: TaxonomyKind, entity_id: &str) -> AppResult<SyncReport> {
        let started = Instant::now();
        let ids = self
            .products
            .find_ids_referencing(kind.product_field(), entity_id)
            .await?;
        let report = self.sync_many(&ids).await;
        tracing::info!(
            entity = %kind,
            entity_id = %entity_id,
            successes = report.successes,
            failures = report.failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resynced products referencing entity"
        );
        Ok(report)
    }

    /// 全量重算（管理接口与定时对账）
    pub async fn resync_all(&self) -> AppResult<SyncReport> {
        let started = Instant::now();
        let ids = self.products.find_all_ids().await?;
        let report = self.sync_many(&ids).await;
        tracing::info!(
            successes = report.successes,
            failures = report.failures,
            total = report.total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full denormalization resync finished"
        );
        Ok(report)
    }
}
