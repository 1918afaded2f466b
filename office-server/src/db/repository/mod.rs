//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

// Auth
pub mod role;
pub mod user;

// Catalog
pub mod category;
pub mod service;
pub mod zone;

// Subscribers
pub mod customer;

// Billing
pub mod counter;
pub mod invoice;

// Dispatch
pub mod task;

// Ledgers
pub mod collector;
pub mod company;

// Re-exports
pub use category::CategoryRepository;
pub use collector::CollectorRepository;
pub use company::CompanyRepository;
pub use counter::CounterRepository;
pub use customer::CustomerRepository;
pub use invoice::InvoiceRepository;
pub use role::RoleRepository;
pub use service::ServiceRepository;
pub use task::TaskRepository;
pub use user::UserRepository;
pub use zone::ZoneRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "invoice:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("invoice", "abc");
//   - 获取表名: id.table()
//   - 获取纯ID: id.key().to_string()
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

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

/// Parse an id string into a RecordId, validating the table name
pub(crate) fn parse_id(id: &str, table: &str) -> RepoResult<surrealdb::RecordId> {
    let rid: surrealdb::RecordId = id
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
    if rid.table() != table {
        return Err(RepoError::Validation(format!(
            "Expected {} id, got: {}",
            table, id
        )));
    }
    Ok(rid)
}

/// Capitalize a name: first letter uppercase, rest lowercase
pub(crate) fn capitalize(name: &str) -> String {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Check a guarded transaction for a THROW marker.
///
/// When a transaction is cancelled, `Response::check` surfaces the
/// lowest-indexed statement error, and every statement other than the THROW
/// itself reports the generic "query was not executed" cancellation message.
/// The marker therefore has to be searched across ALL statement errors; only
/// when it appears nowhere is the failure a genuine database error.
pub(crate) fn check_transaction(
    mut result: surrealdb::Response,
    marker: &str,
    conflict: &str,
) -> RepoResult<()> {
    let errors = result.take_errors();
    if errors.is_empty() {
        return Ok(());
    }
    if errors.values().any(|e| e.to_string().contains(marker)) {
        return Err(RepoError::Conflict(conflict.to_string()));
    }
    let mut messages: Vec<String> = errors.into_values().map(|e| e.to_string()).collect();
    messages.sort();
    messages.dedup();
    Err(RepoError::Database(messages.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::Mem;

    #[tokio::test]
    async fn throw_marker_is_read_across_cancelled_statements() {
        let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("office").use_db("test").await.unwrap();

        // The THROW lands mid-transaction; the statements around it only
        // carry the generic cancellation error.
        let result = db
            .query(
                r#"BEGIN TRANSACTION;
                LET $x = 1;
                IF $x > 0 { THROW "till_short" };
                UPDATE counter:seq SET value = 1;
                COMMIT TRANSACTION;"#,
            )
            .await
            .unwrap();
        let err = check_transaction(result, "till_short", "till cannot cover this").unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

        // A clean transaction passes through
        let result = db
            .query("BEGIN TRANSACTION; UPDATE counter:seq SET value = 2; COMMIT TRANSACTION;")
            .await
            .unwrap();
        assert!(check_transaction(result, "till_short", "unused").is_ok());

        // An unrelated THROW stays a database error
        let result = db
            .query(r#"BEGIN TRANSACTION; THROW "something_else"; COMMIT TRANSACTION;"#)
            .await
            .unwrap();
        let err = check_transaction(result, "till_short", "unused").unwrap_err();
        assert!(matches!(err, RepoError::Database(_)), "got {err:?}");
    }
}
