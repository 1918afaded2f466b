//! Company Model
//!
//! Singleton cash ledger at the fixed record id `company:main`.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Cash withdrawn from the company ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashoutTransaction {
    /// LBP amount withdrawn
    pub amount: f64,
    pub reason: String,
    #[serde(with = "serde_helpers::record_id")]
    pub performed_by: RecordId,
    pub performed_by_name: String,
    pub created_at: i64,
}

/// Company cash ledger singleton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Cash on hand in LBP
    pub cash_balance: f64,
    #[serde(default)]
    pub cashouts: Vec<CashoutTransaction>,
    pub created_at: i64,
    pub updated_at: i64,
}
