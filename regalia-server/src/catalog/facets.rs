//! Facet Aggregation Service
//!
//! 计算目录筛选项：商品投影按匹配条件只扫描一次，四类实体并发读取，
//! 然后每个维度一条 [`Pipeline`] 在同一批行上求值。
//! 任一维度失败则整个结果失败（不返回部分结果）。
//! 结果经 [`ResultCache`] 缓存，key 前缀 `filters:`。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;

use super::pipeline::{
    AggregateSource, Bucket, PriceStats, Pipeline, ProductField, ProductMatch, SortKey,
};
use crate::db::models::TaxonomyKind;
use crate::services::cache::{ResultCache, ttl};
use crate::utils::{AppError, AppResult};
use shared::models::{CatalogFilters, FacetValue, TaxonomyFacet, TaxonomyListItem, TaxonomyListQuery};
use shared::util::now_millis;

const KEY_PREFIX: &str = "filters:";

static FILTER_KEYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^filters:").expect("static pattern"));

fn cache_key(include_inactive: bool) -> String {
    let scope = if include_inactive { "all" } else { "active" };
    format!("{KEY_PREFIX}{scope}")
}

/// 给维度错误加上维度名
async fn dimension<T>(
    name: &'static str,
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    fut.await.map_err(|e| {
        tracing::error!(dimension = name, error = %e, "Facet dimension failed");
        AppError::facet_failed(format!("Failed to compute {name} facet: {}", e.message))
            .with_detail("dimension", name)
    })
}

fn taxonomy_facets(buckets: Vec<Bucket>) -> Vec<TaxonomyFacet> {
    buckets
        .into_iter()
        .filter_map(|b| {
            let entry = b.entry?;
            Some(TaxonomyFacet {
                id: entry.id,
                name: entry.name,
                code: entry.code,
                sort_order: entry.sort_order,
                parent_id: entry.parent_id,
                count: b.count,
            })
        })
        .collect()
}

fn value_facets(buckets: Vec<Bucket>) -> Vec<FacetValue> {
    buckets
        .into_iter()
        .map(|b| FacetValue::new(b.value, b.count))
        .collect()
}

/// 筛选项服务
#[derive(Clone)]
pub struct FacetService {
    source: Arc<dyn AggregateSource>,
    cache: Arc<ResultCache>,
    ttl: Duration,
}

impl FacetService {
    pub fn new(source: Arc<dyn AggregateSource>, cache: Arc<ResultCache>) -> Self {
        Self {
            source,
            cache,
            ttl: ttl::LONG,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 读取筛选项，返回 `(filters, from_cache)`
    pub async fn get_filters(&self, include_inactive: bool) -> AppResult<(Arc<CatalogFilters>, bool)> {
        let key = cache_key(include_inactive);
        self.cache
            .get_or_compute(&key, self.ttl, || self.compute(include_inactive))
            .await
    }

    /// 绕过缓存直接计算
    pub async fn compute(&self, include_inactive: bool) -> AppResult<CatalogFilters> {
        let started = Instant::now();
        let matching = ProductMatch::from_include_inactive(include_inactive);
        let source = &self.source;

        // 停用实体始终排除；include_inactive 只影响商品
        let taxonomy = |kind: TaxonomyKind| {
            Pipeline::unwind(ProductField::Relation(kind))
                .matching(matching)
                .lookup(true)
                .sort(SortKey::DisplayOrder)
        };
        let values = |field: ProductField| {
            Pipeline::unwind(field)
                .matching(matching)
                .sort(SortKey::CountDesc)
        };

        // 一次扫描 + 四类实体，并发读取
        let (rows, category_entries, rite_entries, obedience_entries, degree_entries) =
            tokio::try_join!(
                dimension("products", source.scan_products(matching)),
                dimension("categories", source.taxonomy_entries(TaxonomyKind::Category)),
                dimension("rites", source.taxonomy_entries(TaxonomyKind::Rite)),
                dimension("obediences", source.taxonomy_entries(TaxonomyKind::Obedience)),
                dimension("degrees", source.taxonomy_entries(TaxonomyKind::Degree)),
            )?;

        let categories = taxonomy(TaxonomyKind::Category).evaluate(&rows, &category_entries);
        let rites = taxonomy(TaxonomyKind::Rite).evaluate(&rows, &rite_entries);
        let obediences = taxonomy(TaxonomyKind::Obedience).evaluate(&rows, &obedience_entries);
        let degrees = taxonomy(TaxonomyKind::Degree).evaluate(&rows, &degree_entries);
        let lodge_types = values(ProductField::LodgeTypes).evaluate(&rows, &[]);
        let price_range = PriceStats::new(matching).evaluate(&rows);
        let sizes = values(ProductField::Sizes).evaluate(&rows, &[]);
        let colors = values(ProductField::Colors).evaluate(&rows, &[]);
        let materials = values(ProductField::Materials).evaluate(&rows, &[]);
        let stock_statuses = values(ProductField::StockStatus).evaluate(&rows, &[]);

        tracing::debug!(
            include_inactive,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Catalog filters computed"
        );

        Ok(CatalogFilters {
            categories: taxonomy_facets(categories),
            rites: taxonomy_facets(rites),
            obediences: taxonomy_facets(obediences),
            degrees: taxonomy_facets(degrees),
            lodge_types: value_facets(lodge_types),
            price_range,
            sizes: value_facets(sizes),
            colors: value_facets(colors),
            materials: value_facets(materials),
            stock_statuses: value_facets(stock_statuses),
            include_inactive,
            computed_at: now_millis(),
        })
    }

    /// 清除所有筛选项缓存，返回清除数量
    pub fn invalidate(&self) -> usize {
        let removed = self.cache.invalidate_pattern(&FILTER_KEYS);
        tracing::debug!(removed, "Catalog filter cache invalidated");
        removed
    }

    /// 预热两种筛选项缓存
    pub async fn warm_up(&self) -> AppResult<()> {
        self.get_filters(false).await?;
        self.get_filters(true).await?;
        Ok(())
    }

    /// 单维度列表（导航菜单用），不走缓存。
    ///
    /// 数量只统计上架商品；`hide_empty` 隐含计数并丢弃数量为 0 的实体。
    pub async fn taxonomy_listing(
        &self,
        kind: TaxonomyKind,
        query: &TaxonomyListQuery,
    ) -> AppResult<Vec<TaxonomyListItem>> {
        let mut entries = self.source.taxonomy_entries(kind).await?;
        if query.active_only {
            entries.retain(|e| e.is_active);
        }
        entries.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });

        let counts: Option<HashMap<String, u64>> = if query.needs_counts() {
            let rows = self.source.scan_products(ProductMatch::ActiveOnly).await?;
            let buckets = Pipeline::unwind(ProductField::Relation(kind)).evaluate(&rows, &[]);
            Some(buckets.into_iter().map(|b| (b.value, b.count)).collect())
        } else {
            None
        };

        let items = entries
            .into_iter()
            .map(|e| {
                let product_count = counts
                    .as_ref()
                    .map(|c| c.get(&e.id).copied().unwrap_or(0));
                TaxonomyListItem {
                    id: e.id,
                    name: e.name,
                    code: e.code,
                    sort_order: e.sort_order,
                    is_active: e.is_active,
                    parent_id: e.parent_id,
                    product_count,
                }
            })
            .filter(|item| !query.hide_empty || item.product_count.unwrap_or(0) > 0)
            .collect();
        Ok(items)
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}
