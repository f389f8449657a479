//! Product Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::product::{normalize_tags, validate_merged_pricing};
use crate::db::models::serde_helpers::dedup_record_ids;
use crate::db::models::{DenormalizedFields, Product, ProductCreate, ProductFacetRow, ProductUpdate};
use crate::utils::slug::{slugify, with_suffix};
use shared::error::ErrorCode;
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "product";

/// Slug used when a name folds to nothing
const FALLBACK_SLUG: &str = "produit";

const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub fn record_id(id: &str) -> RepoResult<RecordId> {
        parse_record_id(TABLE, id)
    }

    /// Find all products ordered by name
    pub async fn find_all(&self, active_only: bool) -> RepoResult<Vec<Product>> {
        let sql = if active_only {
            "SELECT * FROM product WHERE is_active = true ORDER BY name"
        } else {
            "SELECT * FROM product ORDER BY name"
        };
        let products: Vec<Product> = self.base.db().query(sql).await?.take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record_id = Self::record_id(id)?;
        let product: Option<Product> = self.base.db().select(record_id).await?;
        Ok(product)
    }

    /// Find product by slug
    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Product>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM product WHERE slug = $slug LIMIT 1")
            .bind(("slug", slug.to_string()))
            .await?;
        let products: Vec<Product> = result.take(0)?;
        Ok(products.into_iter().next())
    }

    /// `base`, `base-2`, `base-3`, ... whichever is free first
    async fn unique_slug(&self, base: &str) -> RepoResult<String> {
        for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
            let candidate = with_suffix(base, attempt);
            if self.find_by_slug(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(RepoError::Duplicate(
            ErrorCode::ProductSlugExists,
            format!("slug '{}' has too many variants", base),
        ))
    }

    /// Create a new product. Denormalized fields start empty until synced.
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let slug = match data.slug {
            Some(slug) => {
                if self.find_by_slug(&slug).await?.is_some() {
                    return Err(RepoError::Duplicate(
                        ErrorCode::ProductSlugExists,
                        format!("Product slug '{}' already exists", slug),
                    ));
                }
                slug
            }
            None => {
                let base = slugify(&data.name);
                let base = if base.is_empty() {
                    FALLBACK_SLUG.to_string()
                } else {
                    base
                };
                self.unique_slug(&base).await?
            }
        };

        let mut categories = data.categories;
        let mut rites = data.rites;
        let mut obediences = data.obediences;
        let mut degree_orders = data.degree_orders;
        for ids in [&mut categories, &mut rites, &mut obediences, &mut degree_orders] {
            dedup_record_ids(ids);
        }
        let mut sizes = data.sizes;
        let mut colors = data.colors;
        let mut materials = data.materials;
        for tags in [&mut sizes, &mut colors, &mut materials] {
            normalize_tags(tags);
        }

        let now = now_millis();
        let product = Product {
            id: None,
            name: data.name.trim().to_string(),
            slug,
            description: data.description,
            price: data.price,
            compare_at_price: data.compare_at_price,
            sale_starts_at: data.sale_starts_at,
            sale_ends_at: data.sale_ends_at,
            categories,
            rites,
            obediences,
            degree_orders,
            lodge_types: Vec::new(),
            rite_codes: Vec::new(),
            obedience_codes: Vec::new(),
            category_slugs: Vec::new(),
            sizes,
            colors,
            materials,
            stock_quantity: data.stock_quantity.unwrap_or(0),
            low_stock_threshold: data
                .low_stock_threshold
                .unwrap_or(crate::db::models::product::DEFAULT_LOW_STOCK_THRESHOLD),
            allow_backorder: data.allow_backorder.unwrap_or(false),
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created: Option<Product> = self.base.db().create(TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Merge an update into a product
    pub async fn update(&self, id: &str, mut data: ProductUpdate) -> RepoResult<Product> {
        let record_id = Self::record_id(id)?;
        let existing: Product = self
            .base
            .db()
            .select(record_id.clone())
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        if let Some(ref new_slug) = data.slug
            && new_slug != &existing.slug
            && self.find_by_slug(new_slug).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                ErrorCode::ProductSlugExists,
                format!("Product slug '{}' already exists", new_slug),
            ));
        }

        // Price rules are checked on the merged result
        let mut merged = existing;
        if let Some(price) = data.price {
            merged.price = price;
        }
        if let Some(compare_at) = data.compare_at_price {
            merged.compare_at_price = compare_at;
        }
        if let Some(starts) = data.sale_starts_at {
            merged.sale_starts_at = starts;
        }
        if let Some(ends) = data.sale_ends_at {
            merged.sale_ends_at = ends;
        }
        validate_merged_pricing(&merged).map_err(|e| RepoError::Validation(e.message))?;

        data.normalize();
        let mut payload = serde_json::to_value(&data)
            .map_err(|e| RepoError::Database(format!("Failed to encode update: {e}")))?;
        payload["updated_at"] = serde_json::Value::from(now_millis());

        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", record_id.clone()))
            .bind(("data", payload))
            .await?
            .check()?;

        self.base
            .db()
            .select(record_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Hard delete; returns the removed product
    pub async fn delete(&self, id: &str) -> RepoResult<Product> {
        let record_id = Self::record_id(id)?;
        let deleted: Option<Product> = self.base.db().delete(record_id).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Overwrite the four denormalized fields. `updated_at` is left alone.
    pub async fn write_denormalized(
        &self,
        id: &RecordId,
        fields: &DenormalizedFields,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", id.clone()))
            .bind(("data", fields.clone()))
            .await?
            .check()?;
        Ok(())
    }

    /// Ids of products whose relation `field` contains `target` ("table:id")
    pub async fn find_ids_referencing(&self, field: &str, target: &str) -> RepoResult<Vec<String>> {
        let sql = format!(
            "SELECT VALUE <string>id FROM product WHERE {} CONTAINS $target",
            field
        );
        let ids: Vec<String> = self
            .base
            .db()
            .query(sql)
            .bind(("target", target.to_string()))
            .await?
            .take(0)?;
        Ok(ids)
    }

    /// Ids of every product
    pub async fn find_all_ids(&self) -> RepoResult<Vec<String>> {
        let ids: Vec<String> = self
            .base
            .db()
            .query("SELECT VALUE <string>id FROM product")
            .await?
            .take(0)?;
        Ok(ids)
    }

    /// Facet projection of the catalog
    pub async fn scan_facet_rows(&self, active_only: bool) -> RepoResult<Vec<ProductFacetRow>> {
        let filter = if active_only { "WHERE is_active = true" } else { "" };
        let sql = format!(
            "SELECT {} FROM product {}",
            ProductFacetRow::PROJECTION,
            filter
        );
        let rows: Vec<ProductFacetRow> = self.base.db().query(sql).await?.take(0)?;
        Ok(rows)
    }
}
