//! 聚合管线
//!
//! 每个筛选维度都是同一个形状：
//!
//! ```text
//! match(商品) → unwind(字段) → group(值, count) → [lookup(实体)] → sort
//! ```
//!
//! 字段引用是 [`ProductField`] 枚举，不是字符串，拼错字段在编译期就会暴露。
//! 管线本身是纯计算（[`Pipeline::evaluate`]），数据来自 [`AggregateSource`]。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;

use crate::db::models::{ProductFacetRow, TaxonomyEntry, TaxonomyKind};
use crate::utils::AppResult;
use shared::models::PriceRange;

/// 聚合数据源
///
/// 生产环境是 SurrealDB（见 `catalog::source`），测试用内存夹具。
#[async_trait]
pub trait AggregateSource: Send + Sync {
    /// 按条件扫描商品的聚合投影
    async fn scan_products(&self, matching: ProductMatch) -> AppResult<Vec<ProductFacetRow>>;

    /// 某个分类维度的全部实体（含停用的）
    async fn taxonomy_entries(&self, kind: TaxonomyKind) -> AppResult<Vec<TaxonomyEntry>>;
}

/// match 阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductMatch {
    All,
    ActiveOnly,
}

impl ProductMatch {
    pub fn from_include_inactive(include_inactive: bool) -> Self {
        if include_inactive {
            ProductMatch::All
        } else {
            ProductMatch::ActiveOnly
        }
    }

    pub fn active_only(&self) -> bool {
        matches!(self, ProductMatch::ActiveOnly)
    }

    pub fn matches(&self, row: &ProductFacetRow) -> bool {
        match self {
            ProductMatch::All => true,
            ProductMatch::ActiveOnly => row.is_active,
        }
    }
}

/// unwind 阶段可展开的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    /// 关系字段，值为 "table:id"
    Relation(TaxonomyKind),
    /// 反范式字段
    LodgeTypes,
    Sizes,
    Colors,
    Materials,
    /// 派生字段，每个商品恰好一个值
    StockStatus,
}

impl ProductField {
    pub fn name(&self) -> &'static str {
        match self {
            ProductField::Relation(kind) => kind.product_field(),
            ProductField::LodgeTypes => "lodge_types",
            ProductField::Sizes => "sizes",
            ProductField::Colors => "colors",
            ProductField::Materials => "materials",
            ProductField::StockStatus => "stock_status",
        }
    }

    /// 单个商品展开后的值，已去重
    fn unwind<'a>(&self, row: &'a ProductFacetRow) -> BTreeSet<&'a str> {
        let values: &'a [String] = match self {
            ProductField::Relation(TaxonomyKind::Category) => &row.categories,
            ProductField::Relation(TaxonomyKind::Rite) => &row.rites,
            ProductField::Relation(TaxonomyKind::Obedience) => &row.obediences,
            ProductField::Relation(TaxonomyKind::Degree) => &row.degree_orders,
            ProductField::LodgeTypes => &row.lodge_types,
            ProductField::Sizes => &row.sizes,
            ProductField::Colors => &row.colors,
            ProductField::Materials => &row.materials,
            ProductField::StockStatus => {
                return BTreeSet::from([row.stock_status().as_str()]);
            }
        };
        values
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// sort 阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// 实体 sort_order，再按名称（需要 lookup）
    DisplayOrder,
    /// 数量降序，再按值
    CountDesc,
    /// 按值
    Value,
}

/// group 阶段的一行
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub value: String,
    pub count: u64,
    /// lookup 命中的实体
    pub entry: Option<TaxonomyEntry>,
}

/// lookup 阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lookup {
    active_only: bool,
}

/// 单维度计数管线
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    field: ProductField,
    matching: ProductMatch,
    lookup: Option<Lookup>,
    sort: SortKey,
}

impl Pipeline {
    /// 从 unwind 字段开始，默认只匹配上架商品、按数量排序
    pub fn unwind(field: ProductField) -> Self {
        Self {
            field,
            matching: ProductMatch::ActiveOnly,
            lookup: None,
            sort: SortKey::CountDesc,
        }
    }

    pub fn matching(mut self, matching: ProductMatch) -> Self {
        self.matching = matching;
        self
    }

    /// 关联实体元数据；找不到的实体丢弃，`active_only` 时停用实体也丢弃。
    /// 非关系字段上调用无效果。
    pub fn lookup(mut self, active_only: bool) -> Self {
        if matches!(self.field, ProductField::Relation(_)) {
            self.lookup = Some(Lookup { active_only });
        }
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = key;
        self
    }

    pub fn field(&self) -> ProductField {
        self.field
    }

    /// 纯计算部分
    pub fn evaluate(&self, rows: &[ProductFacetRow], entries: &[TaxonomyEntry]) -> Vec<Bucket> {
        let mut groups: BTreeMap<&str, u64> = BTreeMap::new();
        for row in rows.iter().filter(|r| self.matching.matches(r)) {
            for value in self.field.unwind(row) {
                *groups.entry(value).or_default() += 1;
            }
        }

        let mut buckets: Vec<Bucket> = match self.lookup {
            None => groups
                .into_iter()
                .map(|(value, count)| Bucket {
                    value: value.to_string(),
                    count,
                    entry: None,
                })
                .collect(),
            Some(lookup) => {
                let by_id: HashMap<&str, &TaxonomyEntry> =
                    entries.iter().map(|e| (e.id.as_str(), e)).collect();
                groups
                    .into_iter()
                    .filter_map(|(value, count)| {
                        let entry = by_id.get(value)?;
                        if lookup.active_only && !entry.is_active {
                            return None;
                        }
                        Some(Bucket {
                            value: value.to_string(),
                            count,
                            entry: Some((*entry).clone()),
                        })
                    })
                    .collect()
            }
        };

        buckets.retain(|b| b.count > 0);
        self.sort_buckets(&mut buckets);
        buckets
    }

    fn sort_buckets(&self, buckets: &mut [Bucket]) {
        match self.sort {
            SortKey::DisplayOrder => buckets.sort_by(|a, b| {
                let key = |x: &Bucket| {
                    x.entry
                        .as_ref()
                        .map(|e| (e.sort_order, e.name.clone()))
                        .unwrap_or((i32::MAX, x.value.clone()))
                };
                key(a).cmp(&key(b))
            }),
            SortKey::CountDesc => {
                buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)))
            }
            SortKey::Value => buckets.sort_by(|a, b| a.value.cmp(&b.value)),
        }
    }
}

/// 价格统计管线：min / max / avg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceStats {
    matching: ProductMatch,
}

impl PriceStats {
    pub fn new(matching: ProductMatch) -> Self {
        Self { matching }
    }

    /// 没有匹配商品时返回 None
    pub fn evaluate(&self, rows: &[ProductFacetRow]) -> Option<PriceRange> {
        let prices: Vec<i64> = rows
            .iter()
            .filter(|r| self.matching.matches(r))
            .map(|r| r.price)
            .collect();
        let min = *prices.iter().min()?;
        let max = *prices.iter().max()?;
        let sum: i128 = prices.iter().map(|&p| p as i128).sum();
        let avg = sum as f64 / prices.len() as f64;
        Some(PriceRange {
            min,
            max,
            avg: (avg * 100.0).round() / 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{entry, row};

    fn rite_rows() -> Vec<ProductFacetRow> {
        vec![
            row("product:p1", true, &["rite:reaa"]),
            row("product:p2", false, &["rite:reaa"]),
            row("product:p3", true, &["rite:rer"]),
        ]
    }

    fn rite_entries() -> Vec<TaxonomyEntry> {
        vec![
            entry("rite:reaa", "Rite Écossais Ancien et Accepté", 1, true),
            entry("rite:rer", "Rite Écossais Rectifié", 2, true),
        ]
    }

    fn counts(buckets: &[Bucket]) -> Vec<(&str, u64)> {
        buckets.iter().map(|b| (b.value.as_str(), b.count)).collect()
    }

    #[test]
    fn test_relation_counts_respect_match_stage() {
        let pipeline = Pipeline::unwind(ProductField::Relation(TaxonomyKind::Rite))
            .lookup(true)
            .sort(SortKey::DisplayOrder);

        let active = pipeline.evaluate(&rite_rows(), &rite_entries());
        assert_eq!(counts(&active), vec![("rite:reaa", 1), ("rite:rer", 1)]);

        let all = pipeline
            .matching(ProductMatch::All)
            .evaluate(&rite_rows(), &rite_entries());
        assert_eq!(counts(&all), vec![("rite:reaa", 2), ("rite:rer", 1)]);
    }

    #[test]
    fn test_lookup_drops_inactive_and_missing_entities() {
        let rows = vec![
            row("product:p1", true, &["rite:reaa", "rite:gone"]),
            row("product:p2", true, &["rite:rer"]),
        ];
        let mut entries = rite_entries();
        entries[1].is_active = false;

        let buckets = Pipeline::unwind(ProductField::Relation(TaxonomyKind::Rite))
            .lookup(true)
            .evaluate(&rows, &entries);
        assert_eq!(counts(&buckets), vec![("rite:reaa", 1)]);
        assert_eq!(
            buckets[0].entry.as_ref().map(|e| e.name.as_str()),
            Some("Rite Écossais Ancien et Accepté")
        );

        let with_inactive = Pipeline::unwind(ProductField::Relation(TaxonomyKind::Rite))
            .lookup(false)
            .evaluate(&rows, &entries);
        assert_eq!(with_inactive.len(), 2);
    }

    #[test]
    fn test_display_order_sort() {
        let rows = vec![row("product:p1", true, &["rite:b", "rite:a", "rite:c"])];
        let entries = vec![
            entry("rite:a", "Zeta", 2, true),
            entry("rite:b", "Alpha", 2, true),
            entry("rite:c", "Omega", 1, true),
        ];
        let buckets = Pipeline::unwind(ProductField::Relation(TaxonomyKind::Rite))
            .lookup(true)
            .sort(SortKey::DisplayOrder)
            .evaluate(&rows, &entries);
        assert_eq!(
            counts(&buckets),
            vec![("rite:c", 1), ("rite:b", 1), ("rite:a", 1)]
        );
    }

    #[test]
    fn test_duplicate_values_count_once_per_product() {
        let mut p1 = row("product:p1", true, &[]);
        p1.colors = vec!["bleu".into(), "bleu".into(), "or".into()];
        let mut p2 = row("product:p2", true, &[]);
        p2.colors = vec!["bleu".into(), "".into()];

        let buckets = Pipeline::unwind(ProductField::Colors).evaluate(&[p1, p2], &[]);
        assert_eq!(counts(&buckets), vec![("bleu", 2), ("or", 1)]);
    }

    #[test]
    fn test_stock_status_dimension() {
        let mut in_stock = row("product:p1", true, &[]);
        in_stock.stock_quantity = 20;
        let mut low = row("product:p2", true, &[]);
        low.stock_quantity = 2;
        let out = row("product:p3", true, &[]);
        let mut backorder = row("product:p4", true, &[]);
        backorder.allow_backorder = true;

        let buckets = Pipeline::unwind(ProductField::StockStatus)
            .sort(SortKey::Value)
            .evaluate(&[in_stock, low, out, backorder], &[]);
        assert_eq!(
            counts(&buckets),
            vec![("in_stock", 1), ("low_stock", 2), ("out_of_stock", 1)]
        );
    }

    #[test]
    fn test_empty_catalog_yields_no_buckets() {
        let buckets = Pipeline::unwind(ProductField::LodgeTypes).evaluate(&[], &[]);
        assert!(buckets.is_empty());
        assert!(PriceStats::new(ProductMatch::ActiveOnly).evaluate(&[]).is_none());
    }

    #[test]
    fn test_price_stats() {
        let mut rows = rite_rows();
        rows[0].price = 1000;
        rows[1].price = 99_000;
        rows[2].price = 2001;

        let active = PriceStats::new(ProductMatch::ActiveOnly).evaluate(&rows).unwrap();
        assert_eq!((active.min, active.max), (1000, 2001));
        assert_eq!(active.avg, 1500.5);

        let all = PriceStats::new(ProductMatch::All).evaluate(&rows).unwrap();
        assert_eq!(all.max, 99_000);
    }

    #[test]
    fn test_lookup_ignored_on_plain_field() {
        let pipeline = Pipeline::unwind(ProductField::Sizes).lookup(true);
        assert_eq!(pipeline, Pipeline::unwind(ProductField::Sizes));
        assert_eq!(pipeline.field().name(), "sizes");
    }
}
