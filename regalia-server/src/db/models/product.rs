//! Product Model

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use super::taxonomy::{Category, DegreeOrder, Obedience, Rite, TaxonomyKind};
use crate::utils::AppError;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, Validate, validate_optional_text, validate_price,
    validate_references, validate_required_text, validate_tags,
};

/// 默认低库存阈值
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Derived stock status, also a facet dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// - above threshold → in stock
    /// - 1..=threshold → low stock
    /// - nothing left → low stock when backorders are allowed, otherwise out of stock
    pub fn derive(quantity: i64, low_stock_threshold: i64, allow_backorder: bool) -> Self {
        if quantity > low_stock_threshold {
            StockStatus::InStock
        } else if quantity > 0 || allow_backorder {
            StockStatus::LowStock
        } else {
            StockStatus::OutOfStock
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,

    /// Price in cents
    pub price: i64,
    #[serde(default)]
    pub compare_at_price: Option<i64>,
    #[serde(default)]
    pub sale_starts_at: Option<i64>,
    #[serde(default)]
    pub sale_ends_at: Option<i64>,

    // -- Relations (stored as "table:id" strings) --
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub categories: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub rites: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub obediences: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub degree_orders: Vec<RecordId>,

    // -- Denormalized, written only by the synchronizer --
    #[serde(default)]
    pub lodge_types: Vec<String>,
    #[serde(default)]
    pub rite_codes: Vec<String>,
    #[serde(default)]
    pub obedience_codes: Vec<String>,
    #[serde(default)]
    pub category_slugs: Vec<String>,

    // -- Free-form facet tags --
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,

    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub allow_backorder: bool,

    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::derive(
            self.stock_quantity,
            self.low_stock_threshold,
            self.allow_backorder,
        )
    }

    /// On sale: compare-at price above the price and `now` inside the window.
    /// Window bounds are optional; start is inclusive, end exclusive.
    pub fn is_on_sale(&self, now: i64) -> bool {
        let discounted = self.compare_at_price.is_some_and(|c| c > self.price);
        let started = self.sale_starts_at.is_none_or(|s| now >= s);
        let not_ended = self.sale_ends_at.is_none_or(|e| now < e);
        discounted && started && not_ended
    }
}

/// Product creation payload. Denormalized fields are not accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    pub sale_starts_at: Option<i64>,
    pub sale_ends_at: Option<i64>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub categories: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub rites: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub obediences: Vec<RecordId>,
    #[serde(default, with = "serde_helpers::vec_record_id")]
    pub degree_orders: Vec<RecordId>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    pub stock_quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub allow_backorder: Option<bool>,
    pub is_active: Option<bool>,
}

/// Product update payload (all optional, merged into the record)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    /// `null` clears the field
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::nullable")]
    pub compare_at_price: Option<Option<i64>>,
    /// `null` clears the field
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::nullable")]
    pub sale_starts_at: Option<Option<i64>>,
    /// `null` clears the field
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::nullable")]
    pub sale_ends_at: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_vec_record_id")]
    pub categories: Option<Vec<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_vec_record_id")]
    pub rites: Option<Vec<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_vec_record_id")]
    pub obediences: Option<Vec<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_vec_record_id")]
    pub degree_orders: Option<Vec<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_backorder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    /// Whether the update changes any taxonomy relation (sync trigger)
    pub fn touches_relations(&self) -> bool {
        self.categories.is_some()
            || self.rites.is_some()
            || self.obediences.is_some()
            || self.degree_orders.is_some()
    }

    /// Dedup relation and tag lists in place
    pub fn normalize(&mut self) {
        for ids in [
            &mut self.categories,
            &mut self.rites,
            &mut self.obediences,
            &mut self.degree_orders,
        ]
        .into_iter()
        .flatten()
        {
            serde_helpers::dedup_record_ids(ids);
        }
        for tags in [&mut self.sizes, &mut self.colors, &mut self.materials]
            .into_iter()
            .flatten()
        {
            normalize_tags(tags);
        }
    }
}

/// Trim, drop empties, sort, dedup
pub fn normalize_tags(tags: &mut Vec<String>) {
    for t in tags.iter_mut() {
        *t = t.trim().to_string();
    }
    tags.retain(|t| !t.is_empty());
    tags.sort();
    tags.dedup();
}

fn validate_sale_window(starts: Option<i64>, ends: Option<i64>) -> Result<(), AppError> {
    if let (Some(s), Some(e)) = (starts, ends)
        && s >= e
    {
        return Err(AppError::validation("sale_starts_at must be before sale_ends_at")
            .with_detail("field", "sale_ends_at"));
    }
    Ok(())
}

fn validate_compare_at(price: i64, compare_at: Option<i64>) -> Result<(), AppError> {
    if let Some(c) = compare_at
        && c <= price
    {
        return Err(AppError::with_message(
            shared::error::ErrorCode::ProductInvalidPrice,
            "compare_at_price must be greater than price",
        )
        .with_detail("field", "compare_at_price"));
    }
    Ok(())
}

fn validate_relations(
    categories: &[RecordId],
    rites: &[RecordId],
    obediences: &[RecordId],
    degree_orders: &[RecordId],
) -> Result<(), AppError> {
    validate_references(categories, TaxonomyKind::Category.table(), "categories")?;
    validate_references(rites, TaxonomyKind::Rite.table(), "rites")?;
    validate_references(obediences, TaxonomyKind::Obedience.table(), "obediences")?;
    validate_references(degree_orders, TaxonomyKind::Degree.table(), "degree_orders")
}

impl Validate for ProductCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&self.description, "description", MAX_DESCRIPTION_LEN)?;
        if let Some(slug) = &self.slug
            && (slug.is_empty() || crate::utils::slug::slugify(slug) != *slug)
        {
            return Err(AppError::validation(format!("slug '{slug}' is not normalized")));
        }
        validate_price(self.price, "price")?;
        validate_compare_at(self.price, self.compare_at_price)?;
        validate_sale_window(self.sale_starts_at, self.sale_ends_at)?;
        validate_relations(
            &self.categories,
            &self.rites,
            &self.obediences,
            &self.degree_orders,
        )?;
        validate_tags(&self.sizes, "sizes")?;
        validate_tags(&self.colors, "colors")?;
        validate_tags(&self.materials, "materials")?;
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err(AppError::validation("low_stock_threshold must not be negative"));
        }
        Ok(())
    }
}

impl Validate for ProductUpdate {
    /// Field-local checks only; cross-field price rules are checked against
    /// the merged record by the repository.
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&self.description, "description", MAX_DESCRIPTION_LEN)?;
        if let Some(slug) = &self.slug
            && crate::utils::slug::slugify(slug) != *slug
        {
            return Err(AppError::validation(format!("slug '{slug}' is not normalized")));
        }
        if let Some(price) = self.price {
            validate_price(price, "price")?;
        }
        validate_relations(
            self.categories.as_deref().unwrap_or_default(),
            self.rites.as_deref().unwrap_or_default(),
            self.obediences.as_deref().unwrap_or_default(),
            self.degree_orders.as_deref().unwrap_or_default(),
        )?;
        for (tags, field) in [
            (&self.sizes, "sizes"),
            (&self.colors, "colors"),
            (&self.materials, "materials"),
        ] {
            if let Some(tags) = tags {
                validate_tags(tags, field)?;
            }
        }
        if self.low_stock_threshold.is_some_and(|t| t < 0) {
            return Err(AppError::validation("low_stock_threshold must not be negative"));
        }
        Ok(())
    }
}

/// Validate price rules on the record that results from a merge
pub fn validate_merged_pricing(product: &Product) -> Result<(), AppError> {
    validate_compare_at(product.price, product.compare_at_price)?;
    validate_sale_window(product.sale_starts_at, product.sale_ends_at)
}

/// The four redundant projections kept on each product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenormalizedFields {
    pub lodge_types: Vec<String>,
    pub rite_codes: Vec<String>,
    pub obedience_codes: Vec<String>,
    pub category_slugs: Vec<String>,
}

impl DenormalizedFields {
    /// Union of the projected attributes over the referenced entities, sorted and deduplicated
    ///
    /// - rite → code, abbreviation
    /// - obedience → code, abbreviation
    /// - degree → lodge_type
    /// - category → slug
    pub fn collect(
        rites: &[Rite],
        obediences: &[Obedience],
        degrees: &[DegreeOrder],
        categories: &[Category],
    ) -> Self {
        let rite_codes: BTreeSet<&str> = rites
            .iter()
            .flat_map(|r| std::iter::once(r.code.as_str()).chain(r.abbreviation.as_deref()))
            .filter(|s| !s.is_empty())
            .collect();
        let obedience_codes: BTreeSet<&str> = obediences
            .iter()
            .flat_map(|o| std::iter::once(o.code.as_str()).chain(o.abbreviation.as_deref()))
            .filter(|s| !s.is_empty())
            .collect();
        let lodge_types: BTreeSet<&str> = degrees
            .iter()
            .map(|d| d.lodge_type.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        let category_slugs: BTreeSet<&str> = categories
            .iter()
            .map(|c| c.slug.as_str())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            lodge_types: lodge_types.into_iter().map(String::from).collect(),
            rite_codes: rite_codes.into_iter().map(String::from).collect(),
            obedience_codes: obedience_codes.into_iter().map(String::from).collect(),
            category_slugs: category_slugs.into_iter().map(String::from).collect(),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.lodge_types == product.lodge_types
            && self.rite_codes == product.rite_codes
            && self.obedience_codes == product.obedience_codes
            && self.category_slugs == product.category_slugs
    }
}

/// Slim projection of a product used by the facet pipelines
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFacetRow {
    pub id: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub rites: Vec<String>,
    #[serde(default)]
    pub obediences: Vec<String>,
    #[serde(default)]
    pub degree_orders: Vec<String>,
    #[serde(default)]
    pub lodge_types: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub allow_backorder: bool,
}

impl ProductFacetRow {
    /// Fields selected by the facet scan
    pub const PROJECTION: &'static str = "<string>id AS id, price, is_active, categories, rites, \
        obediences, degree_orders, lodge_types, sizes, colors, materials, stock_quantity, \
        low_stock_threshold, allow_backorder";

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::derive(
            self.stock_quantity,
            self.low_stock_threshold,
            self.allow_backorder,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rite(code: &str, abbreviation: Option<&str>) -> Rite {
        Rite {
            id: None,
            name: code.to_string(),
            code: code.to_string(),
            abbreviation: abbreviation.map(String::from),
            sort_order: 0,
            is_active: true,
        }
    }

    fn product(price: i64, compare_at: Option<i64>) -> Product {
        serde_json::from_value(serde_json::json!({
            "name": "Tablier Maître REAA",
            "slug": "tablier-maitre-reaa",
            "price": price,
            "compare_at_price": compare_at,
        }))
        .unwrap()
    }

    #[test]
    fn test_stock_status_thresholds() {
        assert_eq!(StockStatus::derive(10, 5, false), StockStatus::InStock);
        assert_eq!(StockStatus::derive(6, 5, false), StockStatus::InStock);
        assert_eq!(StockStatus::derive(5, 5, false), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(1, 5, false), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(0, 5, false), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(0, 5, true), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(-3, 5, false), StockStatus::OutOfStock);
    }

    #[test]
    fn test_product_defaults() {
        let p = product(12000, None);
        assert!(p.is_active);
        assert_eq!(p.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(p.stock_status(), StockStatus::OutOfStock);
        assert!(p.rites.is_empty());
    }

    #[test]
    fn test_is_on_sale_window() {
        let mut p = product(9000, Some(12000));
        assert!(p.is_on_sale(1_000));

        p.sale_starts_at = Some(2_000);
        p.sale_ends_at = Some(3_000);
        assert!(!p.is_on_sale(1_999));
        assert!(p.is_on_sale(2_000));
        assert!(p.is_on_sale(2_999));
        assert!(!p.is_on_sale(3_000));

        let not_discounted = product(12000, Some(12000));
        assert!(!not_discounted.is_on_sale(1_000));
    }

    #[test]
    fn test_collect_is_union_of_codes() {
        let fields = DenormalizedFields::collect(
            &[rite("REAA", Some("RF")), rite("RF", Some("RER"))],
            &[],
            &[],
            &[],
        );
        assert_eq!(fields.rite_codes, vec!["REAA", "RER", "RF"]);
        assert!(fields.lodge_types.is_empty());
    }

    #[test]
    fn test_collect_dedups_lodge_types() {
        let degree = |code: &str, lodge: &str| DegreeOrder {
            id: None,
            name: code.to_string(),
            code: code.to_string(),
            lodge_type: lodge.to_string(),
            degree: None,
            sort_order: 0,
            is_active: true,
        };
        let fields = DenormalizedFields::collect(
            &[],
            &[],
            &[
                degree("apprenti", "symbolic"),
                degree("maitre", "symbolic"),
                degree("18", "high_degrees"),
            ],
            &[],
        );
        assert_eq!(fields.lodge_types, vec!["high_degrees", "symbolic"]);
    }

    #[test]
    fn test_create_rejects_compare_at_not_above_price() {
        let data: ProductCreate = serde_json::from_value(serde_json::json!({
            "name": "Sautoir",
            "price": 5000,
            "compare_at_price": 5000,
        }))
        .unwrap();
        let err = data.validate().unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn test_create_rejects_wrong_table_reference() {
        let data: ProductCreate = serde_json::from_value(serde_json::json!({
            "name": "Sautoir",
            "price": 5000,
            "rites": ["obedience:godf"],
        }))
        .unwrap();
        let err = data.validate().unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::InvalidReference);
    }

    #[test]
    fn test_create_ignores_denormalized_input() {
        let data: ProductCreate = serde_json::from_value(serde_json::json!({
            "name": "Sautoir",
            "price": 5000,
            "rite_codes": ["FAKE"],
        }))
        .unwrap();
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_update_touches_relations_and_normalizes() {
        let mut update: ProductUpdate = serde_json::from_value(serde_json::json!({
            "rites": ["rite:rf", "rite:reaa", "rite:rf"],
            "colors": [" bleu ", "bleu", ""],
        }))
        .unwrap();
        assert!(update.touches_relations());
        update.normalize();
        assert_eq!(update.rites.as_ref().unwrap().len(), 2);
        assert_eq!(update.colors.as_deref(), Some(&["bleu".to_string()][..]));

        let price_only = ProductUpdate {
            price: Some(100),
            ..Default::default()
        };
        assert!(!price_only.touches_relations());
    }
}
