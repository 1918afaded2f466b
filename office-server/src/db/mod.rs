//! Database Module
//!
//! Handles the embedded SurrealDB instance and schema bootstrap

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

/// Table and index definitions, applied at startup. DEFINE statements are
/// idempotent with OVERWRITE.
const SCHEMA: &str = r#"
DEFINE TABLE OVERWRITE role SCHEMALESS;
DEFINE INDEX OVERWRITE role_name ON role FIELDS name UNIQUE;

DEFINE TABLE OVERWRITE user SCHEMALESS;
DEFINE INDEX OVERWRITE user_email ON user FIELDS email UNIQUE;
DEFINE INDEX OVERWRITE user_phone ON user FIELDS phone_number UNIQUE;

DEFINE TABLE OVERWRITE service SCHEMALESS;
DEFINE INDEX OVERWRITE service_name ON service FIELDS name UNIQUE;

DEFINE TABLE OVERWRITE zone SCHEMALESS;
DEFINE INDEX OVERWRITE zone_name ON zone FIELDS name UNIQUE;

DEFINE TABLE OVERWRITE category SCHEMALESS;
DEFINE INDEX OVERWRITE category_name ON category FIELDS name UNIQUE;

DEFINE TABLE OVERWRITE customer SCHEMALESS;
DEFINE INDEX OVERWRITE customer_phone ON customer FIELDS phone_number UNIQUE;

DEFINE TABLE OVERWRITE invoice SCHEMALESS;
DEFINE INDEX OVERWRITE invoice_number ON invoice FIELDS number UNIQUE;
DEFINE INDEX OVERWRITE invoice_status ON invoice FIELDS status;
DEFINE INDEX OVERWRITE invoice_collector ON invoice FIELDS collector;

DEFINE TABLE OVERWRITE task SCHEMALESS;
DEFINE INDEX OVERWRITE task_number ON task FIELDS number UNIQUE;
DEFINE INDEX OVERWRITE task_stage ON task FIELDS stage;

DEFINE TABLE OVERWRITE company SCHEMALESS;
DEFINE TABLE OVERWRITE collector_balance SCHEMALESS;
DEFINE TABLE OVERWRITE collector_transaction SCHEMALESS;
DEFINE TABLE OVERWRITE counter SCHEMALESS;
"#;

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB-backed database at `db_path` and apply
    /// the schema.
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("office")
            .use_db("main")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!("Database connection established (SurrealDB RocksDB)");

        Self::apply_schema(&db).await?;

        Ok(Self { db })
    }

    /// Wrap an existing handle (tests use the in-memory engine).
    pub async fn from_db(db: Surreal<Db>) -> Result<Self, AppError> {
        Self::apply_schema(&db).await?;
        Ok(Self { db })
    }

    async fn apply_schema(db: &Surreal<Db>) -> Result<(), AppError> {
        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;
        tracing::info!("Database schema applied");
        Ok(())
    }
}
