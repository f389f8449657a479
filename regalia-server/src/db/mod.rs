//! Database Module
//!
//! Embedded SurrealDB: RocksDB on disk for the server, in-memory for tests.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

/// Table and index definitions. Tables stay schemaless; only slugs and codes are constrained.
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
DEFINE INDEX IF NOT EXISTS product_slug ON TABLE product FIELDS slug UNIQUE;
DEFINE TABLE IF NOT EXISTS category SCHEMALESS;
DEFINE INDEX IF NOT EXISTS category_slug ON TABLE category FIELDS slug UNIQUE;
DEFINE TABLE IF NOT EXISTS rite SCHEMALESS;
DEFINE INDEX IF NOT EXISTS rite_code ON TABLE rite FIELDS code UNIQUE;
DEFINE TABLE IF NOT EXISTS obedience SCHEMALESS;
DEFINE INDEX IF NOT EXISTS obedience_code ON TABLE obedience FIELDS code UNIQUE;
DEFINE TABLE IF NOT EXISTS degree_order SCHEMALESS;
DEFINE INDEX IF NOT EXISTS degree_order_code ON TABLE degree_order FIELDS code UNIQUE;
"#;

/// Database service, owns the SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB-backed database at `db_path`
    pub async fn new(db_path: &str, namespace: &str, database: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;
        tracing::info!(path = %db_path, "Database opened (RocksDB)");
        Self::prepare(db, namespace, database).await
    }

    /// Volatile database for tests and tooling
    pub async fn in_memory(namespace: &str, database: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;
        Self::prepare(db, namespace, database).await
    }

    async fn prepare(db: Surreal<Db>, namespace: &str, database: &str) -> Result<Self, AppError> {
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| AppError::database(format!("Failed to select ns/db: {e}")))?;

        db.query(SCHEMA)
            .await
            .and_then(|r| r.check())
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        tracing::info!(namespace, database, "Database schema applied");

        Ok(Self { db })
    }
}
