//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

pub mod product;
pub mod taxonomy;

// Re-exports
pub use product::ProductRepository;
pub use taxonomy::{TaxonomyRepository, find_entries};

use shared::error::{AppError, ErrorCode};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// 唯一字段冲突，携带具体的错误码 (slug / code)
    #[error("Duplicate: {1}")]
    Duplicate(ErrorCode, String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        // unique index violation
        if message.contains("already contains") {
            RepoError::Duplicate(ErrorCode::AlreadyExists, message)
        } else {
            RepoError::Database(message)
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(code, msg) => AppError::with_message(code, msg),
            RepoError::InvalidReference(r) => AppError::invalid_reference(r),
            RepoError::InvalidParent(msg) => {
                AppError::with_message(ErrorCode::CategoryParentInvalid, msg)
            }
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "product:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("product", "abc");
//   - 获取表名: id.table()
//   - 关系字段以 id.to_string() 字符串落库，查询时用 <string>id 比较
//
// API 路径参数同时接受 "rite:abc" 和 "abc"。

/// Parse an id from an API path, requiring it to belong to `table`
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<RecordId> {
    let record_id = if id.contains(':') {
        id.parse::<RecordId>()
            .map_err(|_| RepoError::InvalidReference(id.to_string()))?
    } else if id.is_empty() {
        return Err(RepoError::InvalidReference(id.to_string()));
    } else {
        RecordId::from_table_key(table, id)
    };
    if record_id.table() != table {
        return Err(RepoError::InvalidReference(id.to_string()));
    }
    Ok(record_id)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id() {
        let id = parse_record_id("rite", "rite:reaa").unwrap();
        assert_eq!(id.to_string(), "rite:reaa");

        let bare = parse_record_id("rite", "reaa").unwrap();
        assert_eq!(bare.to_string(), "rite:reaa");

        assert!(matches!(
            parse_record_id("rite", "obedience:godf"),
            Err(RepoError::InvalidReference(_))
        ));
        assert!(parse_record_id("rite", "").is_err());
    }

    #[test]
    fn test_repo_error_to_app_error() {
        let err: AppError =
            RepoError::Duplicate(ErrorCode::ProductSlugExists, "slug".into()).into();
        assert_eq!(err.code, ErrorCode::ProductSlugExists);
        assert_eq!(err.code.http_status(), http::StatusCode::CONFLICT);

        let err: AppError = RepoError::InvalidParent("cycle".into()).into();
        assert_eq!(err.code, ErrorCode::CategoryParentInvalid);

        let err: AppError = RepoError::Database("io".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
