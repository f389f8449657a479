//! Taxonomy Repository
//!
//! One generic repository serves rites, obediences, degrees and categories.

use std::marker::PhantomData;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{TaxonomyEntity, TaxonomyEntry, TaxonomyKind};
use crate::utils::slug::with_suffix;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

/// Deepest category chain walked when checking for cycles
const MAX_PARENT_DEPTH: usize = 64;

/// Upper bound on `-N` slug suffixes tried before giving up
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

pub struct TaxonomyRepository<T> {
    base: BaseRepository,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for TaxonomyRepository<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: TaxonomyEntity> TaxonomyRepository<T> {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        T::KIND.table()
    }

    pub fn record_id(id: &str) -> RepoResult<RecordId> {
        parse_record_id(Self::table(), id)
    }

    /// All entities ordered by sort order then name
    pub async fn find_all(&self, active_only: bool) -> RepoResult<Vec<T>> {
        let filter = if active_only { "WHERE is_active = true" } else { "" };
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY sort_order, name",
            Self::table(),
            filter
        );
        let items: Vec<T> = self.base.db().query(sql).await?.take(0)?;
        Ok(items)
    }

    /// Find by "table:id" or bare key
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<T>> {
        let record_id = Self::record_id(id)?;
        self.find_by_record(&record_id).await
    }

    pub async fn find_by_record(&self, id: &RecordId) -> RepoResult<Option<T>> {
        let item: Option<T> = self.base.db().select(id.clone()).await?;
        Ok(item)
    }

    /// Batch lookup; unknown ids are silently absent from the result
    pub async fn find_by_ids(&self, ids: &[RecordId]) -> RepoResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let sql = format!("SELECT * FROM {} WHERE <string>id IN $ids", Self::table());
        let items: Vec<T> = self
            .base
            .db()
            .query(sql)
            .bind(("ids", keys))
            .await?
            .take(0)?;
        Ok(items)
    }

    /// Find by the unique field (`code` or `slug`)
    pub async fn find_by_unique(&self, value: &str) -> RepoResult<Option<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $value LIMIT 1",
            Self::table(),
            T::UNIQUE_FIELD
        );
        let mut result = self
            .base
            .db()
            .query(sql)
            .bind(("value", value.to_string()))
            .await?;
        let items: Vec<T> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    async fn next_free_unique(&self, base: &str) -> RepoResult<String> {
        for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
            let candidate = with_suffix(base, attempt);
            if self.find_by_unique(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(RepoError::Duplicate(
            T::KIND.duplicate_code(),
            format!("{} '{}' has too many variants", T::UNIQUE_FIELD, base),
        ))
    }

    /// The parent must exist and must not have `self_id` among its ancestors
    async fn check_parent(&self, self_id: Option<&RecordId>, parent: &RecordId) -> RepoResult<()> {
        if parent.table() != Self::table() {
            return Err(RepoError::InvalidReference(parent.to_string()));
        }
        let self_key = self_id.map(|id| id.to_string());
        let mut cursor = Some(parent.clone());
        let mut depth = 0;

        while let Some(current) = cursor {
            if self_key.as_deref() == Some(current.to_string().as_str()) {
                return Err(RepoError::InvalidParent(format!(
                    "{} cannot be its own ancestor",
                    current
                )));
            }
            let Some(node) = self.find_by_record(&current).await? else {
                if depth == 0 {
                    return Err(RepoError::NotFound(format!("{} {} not found", T::KIND, current)));
                }
                break;
            };
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                return Err(RepoError::InvalidParent(format!(
                    "{} hierarchy deeper than {}",
                    T::KIND,
                    MAX_PARENT_DEPTH
                )));
            }
            cursor = node.parent().cloned();
        }
        Ok(())
    }

    /// Create a new entity
    pub async fn create(&self, data: T::Create) -> RepoResult<T> {
        let mut entity = T::from_create(data);

        let wanted = entity.unique_value().to_string();
        if T::SUFFIX_ON_COLLISION {
            let free = self.next_free_unique(&wanted).await?;
            entity.set_unique_value(free);
        } else if self.find_by_unique(&wanted).await?.is_some() {
            return Err(RepoError::Duplicate(
                T::KIND.duplicate_code(),
                format!("{} {} '{}' already exists", T::KIND, T::UNIQUE_FIELD, wanted),
            ));
        }

        if let Some(parent) = entity.parent() {
            self.check_parent(None, parent).await?;
        }

        let created: Option<T> = self
            .base
            .db()
            .create(Self::table())
            .content(entity)
            .await?;
        created.ok_or_else(|| RepoError::Database(format!("Failed to create {}", T::KIND)))
    }

    /// Merge an update into an existing entity
    pub async fn update(&self, id: &str, data: T::Update) -> RepoResult<T> {
        let record_id = Self::record_id(id)?;
        let existing = self
            .find_by_record(&record_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("{} {} not found", T::KIND, id)))?;

        if let Some(new_value) = T::update_unique_value(&data)
            && new_value != existing.unique_value()
            && self.find_by_unique(new_value).await?.is_some()
        {
            return Err(RepoError::Duplicate(
                T::KIND.duplicate_code(),
                format!("{} {} '{}' already exists", T::KIND, T::UNIQUE_FIELD, new_value),
            ));
        }

        if let Some(parent) = T::update_parent(&data) {
            self.check_parent(Some(&record_id), parent).await?;
        }

        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", record_id.clone()))
            .bind(("data", data))
            .await?
            .check()?;

        self.find_by_record(&record_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("{} {} not found", T::KIND, id)))
    }

    /// Hard delete; returns the removed entity
    pub async fn delete(&self, id: &str) -> RepoResult<T> {
        let record_id = Self::record_id(id)?;
        let deleted: Option<T> = self.base.db().delete(record_id).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("{} {} not found", T::KIND, id)))
    }
}

/// Uniform entries for one taxonomy dimension
pub async fn find_entries(
    db: &Surreal<Db>,
    kind: TaxonomyKind,
    active_only: bool,
) -> RepoResult<Vec<TaxonomyEntry>> {
    let filter = if active_only { "WHERE is_active = true" } else { "" };
    let sql = format!(
        "SELECT {} FROM {} {}",
        kind.entry_projection(),
        kind.table(),
        filter
    );
    let entries: Vec<TaxonomyEntry> = db.query(sql).await?.take(0)?;
    Ok(entries)
}
