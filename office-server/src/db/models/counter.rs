//! Counter Model
//!
//! Named monotonic counters (task numbers, invoice sequences). Record id is
//! the counter name, increments go through a single atomic UPSERT.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub value: i64,
}
