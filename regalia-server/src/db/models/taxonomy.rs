//! Taxonomy Models
//!
//! Rite, Obedience, DegreeOrder and Category. Products reference them through
//! relation fields; the synchronizer projects their codes onto the product.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, Validate, validate_optional_text,
    validate_references, validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

/// 分类维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Category,
    Rite,
    Obedience,
    Degree,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 4] = [
        TaxonomyKind::Category,
        TaxonomyKind::Rite,
        TaxonomyKind::Obedience,
        TaxonomyKind::Degree,
    ];

    /// SurrealDB table
    pub const fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Rite => "rite",
            TaxonomyKind::Obedience => "obedience",
            TaxonomyKind::Degree => "degree_order",
        }
    }

    /// Relation field on `product` that references this kind
    pub const fn product_field(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Rite => "rites",
            TaxonomyKind::Obedience => "obediences",
            TaxonomyKind::Degree => "degree_orders",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Rite => "rite",
            TaxonomyKind::Obedience => "obedience",
            TaxonomyKind::Degree => "degree",
        }
    }

    pub const fn not_found_code(&self) -> ErrorCode {
        match self {
            TaxonomyKind::Category => ErrorCode::CategoryNotFound,
            TaxonomyKind::Rite => ErrorCode::RiteNotFound,
            TaxonomyKind::Obedience => ErrorCode::ObedienceNotFound,
            TaxonomyKind::Degree => ErrorCode::DegreeOrderNotFound,
        }
    }

    /// 唯一字段冲突时的错误码：分类按 slug，其余按 code
    pub const fn duplicate_code(&self) -> ErrorCode {
        match self {
            TaxonomyKind::Category => ErrorCode::CategorySlugExists,
            _ => ErrorCode::TaxonomyCodeExists,
        }
    }

    /// Projection onto [`TaxonomyEntry`]; categories expose their slug as the code
    pub const fn entry_projection(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => {
                "<string>id AS id, name, slug AS code, sort_order, is_active, parent AS parent_id"
            }
            _ => "<string>id AS id, name, code, sort_order, is_active",
        }
    }

    pub fn not_found(&self, id: &str) -> AppError {
        AppError::with_message(self.not_found_code(), format!("{} {} not found", self.name(), id))
            .with_detail("id", id)
    }
}

impl std::fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform read-only view over any taxonomy entity (aggregation joins, listings)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxonomyEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Behaviour shared by the four taxonomy tables
pub trait TaxonomyEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: TaxonomyKind;
    /// `code` for rites/obediences/degrees, `slug` for categories
    const UNIQUE_FIELD: &'static str;
    /// Collisions on the unique field get `-2`, `-3`, ... instead of failing
    const SUFFIX_ON_COLLISION: bool = false;

    type Create: DeserializeOwned + Validate + Send + Sync;
    type Update: DeserializeOwned + Serialize + Validate + Send + Sync + 'static;

    fn from_create(data: Self::Create) -> Self;
    fn id(&self) -> Option<&RecordId>;
    fn unique_value(&self) -> &str;
    fn set_unique_value(&mut self, value: String);
    fn update_unique_value(update: &Self::Update) -> Option<&str>;

    /// Parent reference, categories only
    fn parent(&self) -> Option<&RecordId> {
        None
    }

    fn update_parent(_update: &Self::Update) -> Option<&RecordId> {
        None
    }

    fn entry(&self) -> TaxonomyEntry;
}

fn default_true() -> bool {
    true
}

fn validate_code(code: &str) -> Result<(), AppError> {
    validate_required_text(code, "code", MAX_SHORT_TEXT_LEN)?;
    if code.chars().any(char::is_whitespace) {
        return Err(AppError::validation("code must not contain whitespace").with_detail("field", "code"));
    }
    Ok(())
}

fn id_string(id: &Option<RecordId>) -> String {
    id.as_ref().map(|i| i.to_string()).unwrap_or_default()
}

// =============================================================================
// Rite
// =============================================================================

/// Masonic rite (REAA, RF, RER, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rite {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiteCreate {
    pub name: String,
    pub code: String,
    pub abbreviation: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for RiteCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_code(&self.code)?;
        validate_optional_text(&self.abbreviation, "abbreviation", MAX_SHORT_TEXT_LEN)
    }
}

impl Validate for RiteUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        validate_optional_text(&self.abbreviation, "abbreviation", MAX_SHORT_TEXT_LEN)
    }
}

impl TaxonomyEntity for Rite {
    const KIND: TaxonomyKind = TaxonomyKind::Rite;
    const UNIQUE_FIELD: &'static str = "code";
    type Create = RiteCreate;
    type Update = RiteUpdate;

    fn from_create(data: RiteCreate) -> Self {
        Self {
            id: None,
            name: data.name.trim().to_string(),
            code: data.code,
            abbreviation: data.abbreviation,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
        }
    }

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn unique_value(&self) -> &str {
        &self.code
    }

    fn set_unique_value(&mut self, value: String) {
        self.code = value;
    }

    fn update_unique_value(update: &RiteUpdate) -> Option<&str> {
        update.code.as_deref()
    }

    fn entry(&self) -> TaxonomyEntry {
        TaxonomyEntry {
            id: id_string(&self.id),
            name: self.name.clone(),
            code: Some(self.code.clone()),
            sort_order: self.sort_order,
            is_active: self.is_active,
            parent_id: None,
        }
    }
}

// =============================================================================
// Obedience
// =============================================================================

/// Masonic obedience (GODF, GLNF, GLDF, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obedience {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObedienceCreate {
    pub name: String,
    pub code: String,
    pub abbreviation: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObedienceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for ObedienceCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_code(&self.code)?;
        validate_optional_text(&self.abbreviation, "abbreviation", MAX_SHORT_TEXT_LEN)
    }
}

impl Validate for ObedienceUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        validate_optional_text(&self.abbreviation, "abbreviation", MAX_SHORT_TEXT_LEN)
    }
}

impl TaxonomyEntity for Obedience {
    const KIND: TaxonomyKind = TaxonomyKind::Obedience;
    const UNIQUE_FIELD: &'static str = "code";
    type Create = ObedienceCreate;
    type Update = ObedienceUpdate;

    fn from_create(data: ObedienceCreate) -> Self {
        Self {
            id: None,
            name: data.name.trim().to_string(),
            code: data.code,
            abbreviation: data.abbreviation,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
        }
    }

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn unique_value(&self) -> &str {
        &self.code
    }

    fn set_unique_value(&mut self, value: String) {
        self.code = value;
    }

    fn update_unique_value(update: &ObedienceUpdate) -> Option<&str> {
        update.code.as_deref()
    }

    fn entry(&self) -> TaxonomyEntry {
        TaxonomyEntry {
            id: id_string(&self.id),
            name: self.name.clone(),
            code: Some(self.code.clone()),
            sort_order: self.sort_order,
            is_active: self.is_active,
            parent_id: None,
        }
    }
}

// =============================================================================
// DegreeOrder
// =============================================================================

/// Degree (Apprenti, Compagnon, Maître, 18°, ...) and the lodge type it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeOrder {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub code: String,
    /// `symbolic`, `high_degrees`, ...
    pub lodge_type: String,
    #[serde(default)]
    pub degree: Option<u16>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DegreeOrderCreate {
    pub name: String,
    pub code: String,
    pub lodge_type: String,
    pub degree: Option<u16>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeOrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lodge_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for DegreeOrderCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_code(&self.code)?;
        validate_required_text(&self.lodge_type, "lodge_type", MAX_SHORT_TEXT_LEN)
    }
}

impl Validate for DegreeOrderUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        validate_optional_text(&self.lodge_type, "lodge_type", MAX_SHORT_TEXT_LEN)
    }
}

impl TaxonomyEntity for DegreeOrder {
    const KIND: TaxonomyKind = TaxonomyKind::Degree;
    const UNIQUE_FIELD: &'static str = "code";
    type Create = DegreeOrderCreate;
    type Update = DegreeOrderUpdate;

    fn from_create(data: DegreeOrderCreate) -> Self {
        Self {
            id: None,
            name: data.name.trim().to_string(),
            code: data.code,
            lodge_type: data.lodge_type.trim().to_string(),
            degree: data.degree,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
        }
    }

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn unique_value(&self) -> &str {
        &self.code
    }

    fn set_unique_value(&mut self, value: String) {
        self.code = value;
    }

    fn update_unique_value(update: &DegreeOrderUpdate) -> Option<&str> {
        update.code.as_deref()
    }

    fn entry(&self) -> TaxonomyEntry {
        TaxonomyEntry {
            id: id_string(&self.id),
            name: self.name.clone(),
            code: Some(self.code.clone()),
            sort_order: self.sort_order,
            is_active: self.is_active,
            parent_id: None,
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Product category, arbitrarily nested through `parent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true", deserialize_with = "serde_helpers::bool_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    /// Derived from `name` when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub parent: Option<RecordId>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::nullable_record_id"
    )]
    pub parent: Option<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    validate_required_text(slug, "slug", MAX_SHORT_TEXT_LEN)?;
    if crate::utils::slug::slugify(slug) != slug {
        return Err(AppError::validation(format!("slug '{slug}' is not normalized"))
            .with_detail("field", "slug"));
    }
    Ok(())
}

impl Validate for CategoryCreate {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        } else if crate::utils::slug::slugify(&self.name).is_empty() {
            return Err(AppError::validation("name does not produce a usable slug")
                .with_detail("field", "name"));
        }
        validate_optional_text(&self.description, "description", MAX_DESCRIPTION_LEN)?;
        if let Some(parent) = &self.parent {
            validate_references(std::slice::from_ref(parent), TaxonomyKind::Category.table(), "parent")?;
        }
        Ok(())
    }
}

impl Validate for CategoryUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(&self.name, "name", MAX_NAME_LEN)?;
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        validate_optional_text(&self.description, "description", MAX_DESCRIPTION_LEN)?;
        if let Some(Some(parent)) = &self.parent {
            validate_references(std::slice::from_ref(parent), TaxonomyKind::Category.table(), "parent")?;
        }
        Ok(())
    }
}

impl TaxonomyEntity for Category {
    const KIND: TaxonomyKind = TaxonomyKind::Category;
    const UNIQUE_FIELD: &'static str = "slug";
    const SUFFIX_ON_COLLISION: bool = true;
    type Create = CategoryCreate;
    type Update = CategoryUpdate;

    fn from_create(data: CategoryCreate) -> Self {
        let slug = data
            .slug
            .unwrap_or_else(|| crate::utils::slug::slugify(&data.name));
        Self {
            id: None,
            name: data.name.trim().to_string(),
            slug,
            description: data.description,
            parent: data.parent,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: data.is_active.unwrap_or(true),
        }
    }

    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn unique_value(&self) -> &str {
        &self.slug
    }

    fn set_unique_value(&mut self, value: String) {
        self.slug = value;
    }

    fn update_unique_value(update: &CategoryUpdate) -> Option<&str> {
        update.slug.as_deref()
    }

    fn parent(&self) -> Option<&RecordId> {
        self.parent.as_ref()
    }

    fn update_parent(update: &CategoryUpdate) -> Option<&RecordId> {
        update.parent.as_ref().and_then(|p| p.as_ref())
    }

    fn entry(&self) -> TaxonomyEntry {
        TaxonomyEntry {
            id: id_string(&self.id),
            name: self.name.clone(),
            code: Some(self.slug.clone()),
            sort_order: self.sort_order,
            is_active: self.is_active,
            parent_id: self.parent.as_ref().map(|p| p.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tables_and_fields() {
        assert_eq!(TaxonomyKind::Degree.table(), "degree_order");
        assert_eq!(TaxonomyKind::Degree.product_field(), "degree_orders");
        assert_eq!(TaxonomyKind::Category.product_field(), "categories");
        assert_eq!(
            TaxonomyKind::Obedience.not_found_code(),
            ErrorCode::ObedienceNotFound
        );
    }

    #[test]
    fn test_category_slug_from_name() {
        let data: CategoryCreate =
            serde_json::from_str(r#"{"name":"Décors & Sautoirs"}"#).unwrap();
        data.validate().unwrap();
        let category = Category::from_create(data);
        assert_eq!(category.slug, "decors-sautoirs");
        assert!(category.is_active);
    }

    #[test]
    fn test_category_rejects_foreign_parent() {
        let data: CategoryCreate =
            serde_json::from_str(r#"{"name":"Tabliers","parent":"rite:reaa"}"#).unwrap();
        let err = data.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidReference);
    }

    #[test]
    fn test_category_rejects_unnormalized_slug() {
        let data: CategoryCreate =
            serde_json::from_str(r#"{"name":"Tabliers","slug":"Tabliers Maître"}"#).unwrap();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_rite_code_rejects_whitespace() {
        let data: RiteCreate =
            serde_json::from_str(r#"{"name":"Rite Français","code":"R F"}"#).unwrap();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update: RiteUpdate = serde_json::from_str(r#"{"code":"RER"}"#).unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"code": "RER"}));
    }

    #[test]
    fn test_entry_view() {
        let rite = Rite {
            id: Some(RecordId::from_table_key("rite", "reaa")),
            name: "Rite Écossais Ancien et Accepté".into(),
            code: "REAA".into(),
            abbreviation: Some("REAA".into()),
            sort_order: 1,
            is_active: true,
        };
        let entry = rite.entry();
        assert_eq!(entry.id, "rite:reaa");
        assert_eq!(entry.code.as_deref(), Some("REAA"));
    }
}
