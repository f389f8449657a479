//! 测试夹具：内存数据源

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::pipeline::{AggregateSource, ProductMatch};
use crate::db::models::product::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::db::models::{ProductFacetRow, TaxonomyEntry, TaxonomyKind};
use crate::utils::{AppError, AppResult};

/// 商品行，`rites` 为关系值
pub fn row(id: &str, is_active: bool, rites: &[&str]) -> ProductFacetRow {
    ProductFacetRow {
        id: id.to_string(),
        price: 10_000,
        is_active,
        rites: rites.iter().map(|r| r.to_string()).collect(),
        low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        ..Default::default()
    }
}

pub fn entry(id: &str, name: &str, sort_order: i32, is_active: bool) -> TaxonomyEntry {
    TaxonomyEntry {
        id: id.to_string(),
        name: name.to_string(),
        code: None,
        sort_order,
        is_active,
        parent_id: None,
    }
}

#[derive(Default)]
pub struct MemorySource {
    pub products: Vec<ProductFacetRow>,
    pub entries: HashMap<TaxonomyKind, Vec<TaxonomyEntry>>,
    /// 这个维度的实体查询失败
    pub failing: Option<TaxonomyKind>,
    pub scans: AtomicUsize,
}

impl MemorySource {
    pub fn with_entries(mut self, kind: TaxonomyKind, entries: Vec<TaxonomyEntry>) -> Self {
        self.entries.insert(kind, entries);
        self
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AggregateSource for MemorySource {
    async fn scan_products(&self, matching: ProductMatch) -> AppResult<Vec<ProductFacetRow>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .products
            .iter()
            .filter(|r| matching.matches(r))
            .cloned()
            .collect())
    }

    async fn taxonomy_entries(&self, kind: TaxonomyKind) -> AppResult<Vec<TaxonomyEntry>> {
        if self.failing == Some(kind) {
            return Err(AppError::database(format!("{kind} table unavailable")));
        }
        Ok(self.entries.get(&kind).cloned().unwrap_or_default())
    }
}

/// 扫描会卡住直到 [`GatedSource::open`]，用来在计算进行中插入变更
pub struct GatedSource {
    pub inner: MemorySource,
    opened: AtomicBool,
    scanning: Notify,
    gate: Notify,
}

impl GatedSource {
    pub fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            opened: AtomicBool::new(false),
            scanning: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// 等到有扫描卡在闸门上
    pub async fn wait_until_scanning(&self) {
        self.scanning.notified().await;
    }

    /// 放行当前和之后的所有扫描
    pub fn open(&self) {
        self.opened.store(true, Ordering::SeqCst);
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl AggregateSource for GatedSource {
    async fn scan_products(&self, matching: ProductMatch) -> AppResult<Vec<ProductFacetRow>> {
        if !self.opened.load(Ordering::SeqCst) {
            let released = self.gate.notified();
            self.scanning.notify_one();
            released.await;
        }
        self.inner.scan_products(matching).await
    }

    async fn taxonomy_entries(&self, kind: TaxonomyKind) -> AppResult<Vec<TaxonomyEntry>> {
        self.inner.taxonomy_entries(kind).await
    }
}
