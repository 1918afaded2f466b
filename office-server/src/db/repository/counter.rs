//! Counter Repository
//!
//! Named monotonic sequences. `next()` is a single atomic UPSERT so two
//! concurrent callers can never observe the same value.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Counter;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Increment the named counter and return the new value (first call
    /// returns 1).
    pub async fn next(&self, name: &str) -> RepoResult<i64> {
        let id = RecordId::from_table_key("counter", name);
        let mut result = self
            .base
            .db()
            .query("UPSERT $id SET value += 1 RETURN AFTER")
            .bind(("id", id))
            .await?;

        let counter: Option<Counter> = result.take(0)?;
        counter
            .map(|c| c.value)
            .ok_or_else(|| RepoError::Database(format!("Counter '{}' upsert failed", name)))
    }
}
