//! Invoice Model
//!
//! Monthly subscription invoices. Amounts are LBP. `status` is always
//! derived from `amount`, `discount` and `paid_amount` by
//! [`crate::billing::derive_status`], never set independently.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Invoice payment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            other => Err(format!("Unknown invoice status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Human-readable number, `INV-YYYYMM-NNNN`
    pub number: String,
    #[serde(with = "serde_helpers::record_id")]
    pub customer: RecordId,
    /// Service plan the invoice bills for
    #[serde(with = "serde_helpers::record_id")]
    pub service: RecordId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub collector: Option<RecordId>,
    /// Billing period, `YYYY-MM`
    pub period: String,
    /// Gross amount in LBP before discount
    pub amount: f64,
    /// Percentage 0..=100
    pub discount: f64,
    /// Sum of recorded payments in LBP
    pub paid_amount: f64,
    pub status: InvoiceStatus,
    /// Unix millis, 15th of the month after the billing period
    pub due_date: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Payload for manually created invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCreate {
    #[serde(with = "serde_helpers::record_id")]
    pub customer: RecordId,
    pub amount: f64,
    /// Defaults to the current month when omitted
    pub period: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub collector: Option<RecordId>,
}

/// Administrative fields adjustable after creation. Money fields only move
/// through the discount and payment operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub collector: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
}
