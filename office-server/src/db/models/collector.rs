//! Collector Ledger Models
//!
//! Each collector has one balance record at the deterministic id
//! `collector_balance:<collector key>`, plus an append-only stream of
//! `collector_transaction` records.

use super::serde_helpers;
use crate::ledger::Currency;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Transaction direction, from the company's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Cash received from the collector into the company till
    Received,
    /// Cash paid out to the collector
    Paid,
}

/// Running balance held by a collector, tracked per currency.
///
/// Balances are ledger shorthand, not a cash inventory, so they may go
/// negative (the collector owes the company).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorBalance {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub collector: RecordId,
    #[serde(default)]
    pub lbp_balance: f64,
    #[serde(default)]
    pub usd_balance: f64,
    pub updated_at: i64,
}

/// One entry in a collector's ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorTransaction {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub collector: RecordId,
    pub tx_type: TransactionType,
    /// Amount in the transaction currency
    pub amount: f64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Admin who processed the movement
    #[serde(with = "serde_helpers::record_id")]
    pub processed_by: RecordId,
    pub created_at: i64,
}
