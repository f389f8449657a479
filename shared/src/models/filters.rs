//! Catalog filter DTOs
//!
//! Wire shapes for `/api/filters` and the per-dimension taxonomy listings.
//! Field names are camelCase to match the storefront.

use serde::{Deserialize, Serialize};

/// One taxonomy value in a facet dimension (category / rite / obedience / degree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyFacet {
    /// Record id, `table:key`
    pub id: String,
    pub name: String,
    /// Short code (rite / obedience / degree) or slug (category)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub sort_order: i32,
    /// Parent category, categories only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub count: u64,
}

/// One scalar value in a facet dimension (lodge type, size, color, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

impl FacetValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Price statistics over the matched products, in cents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
}

/// Full facet structure for the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilters {
    pub categories: Vec<TaxonomyFacet>,
    pub rites: Vec<TaxonomyFacet>,
    pub obediences: Vec<TaxonomyFacet>,
    pub degrees: Vec<TaxonomyFacet>,
    pub lodge_types: Vec<FacetValue>,
    /// None when no product matches
    pub price_range: Option<PriceRange>,
    pub sizes: Vec<FacetValue>,
    pub colors: Vec<FacetValue>,
    pub materials: Vec<FacetValue>,
    pub stock_statuses: Vec<FacetValue>,
    pub include_inactive: bool,
    /// Computation timestamp (epoch millis)
    pub computed_at: i64,
}

/// `GET /api/filters` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    #[serde(flatten)]
    pub filters: CatalogFilters,
    pub from_cache: bool,
}

/// `GET /api/filters` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// `DELETE /api/filters` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateResponse {
    /// Number of cache entries removed
    pub invalidated: usize,
    pub invalidated_at: i64,
}

/// Query for the per-dimension listing endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyListQuery {
    #[serde(default)]
    pub with_product_count: bool,
    #[serde(default = "default_true")]
    pub active_only: bool,
    #[serde(default)]
    pub hide_empty: bool,
}

impl Default for TaxonomyListQuery {
    fn default() -> Self {
        Self {
            with_product_count: false,
            active_only: true,
            hide_empty: false,
        }
    }
}

impl TaxonomyListQuery {
    /// `hideEmpty` needs counts even when they were not asked for
    pub fn needs_counts(&self) -> bool {
        self.with_product_count || self.hide_empty
    }
}

fn default_true() -> bool {
    true
}

/// One entity in a per-dimension listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyListItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Present only when counts were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
}

/// Outcome of a batch denormalization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub successes: usize,
    pub failures: usize,
    pub total: usize,
}

impl SyncReport {
    pub fn merge(&mut self, other: SyncReport) {
        self.successes += other.successes;
        self.failures += other.failures;
        self.total += other.total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_filters() -> CatalogFilters {
        CatalogFilters {
            categories: vec![],
            rites: vec![TaxonomyFacet {
                id: "rite:reaa".into(),
                name: "Rite Écossais Ancien et Accepté".into(),
                code: Some("REAA".into()),
                sort_order: 1,
                parent_id: None,
                count: 2,
            }],
            obediences: vec![],
            degrees: vec![],
            lodge_types: vec![],
            price_range: None,
            sizes: vec![],
            colors: vec![],
            materials: vec![],
            stock_statuses: vec![FacetValue::new("in_stock", 2)],
            include_inactive: false,
            computed_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_filters_response_is_flat_camel_case() {
        let body = FiltersResponse {
            filters: empty_filters(),
            from_cache: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["fromCache"], true);
        assert_eq!(json["computedAt"], 1_700_000_000_000i64);
        assert_eq!(json["rites"][0]["code"], "REAA");
        assert_eq!(json["rites"][0]["sortOrder"], 1);
        assert!(json["rites"][0].get("parentId").is_none());
        assert_eq!(json["stockStatuses"][0]["value"], "in_stock");
        assert!(json["priceRange"].is_null());
    }

    #[test]
    fn test_list_query_defaults() {
        let q: TaxonomyListQuery = serde_json::from_str("{}").unwrap();
        assert!(!q.with_product_count);
        assert!(q.active_only);
        assert!(!q.hide_empty);
        assert!(!q.needs_counts());

        let q: TaxonomyListQuery = serde_json::from_str(r#"{"hideEmpty":true}"#).unwrap();
        assert!(q.needs_counts());
    }

    #[test]
    fn test_sync_report_merge() {
        let mut total = SyncReport::default();
        total.merge(SyncReport {
            successes: 9,
            failures: 1,
            total: 10,
        });
        total.merge(SyncReport {
            successes: 3,
            failures: 0,
            total: 3,
        });
        assert_eq!(
            total,
            SyncReport {
                successes: 12,
                failures: 1,
                total: 13
            }
        );
    }
}
