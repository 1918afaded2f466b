//! Billing arithmetic
//!
//! Pure money math for invoices. All amounts are LBP `f64`; comparisons use
//! [`MONEY_TOLERANCE`] so float rounding never flips a status.
//!
//! Status is a pure function of `(amount, discount, paid_amount)` via
//! [`derive_status`]. Callers recompute it after every mutation instead of
//! patching the stored value.

use thiserror::Error;

use crate::db::models::InvoiceStatus;

#[cfg(test)]
mod tests;

/// Absolute tolerance for money comparisons, in LBP
pub const MONEY_TOLERANCE: f64 = 0.01;

/// Invoice numbers look like `INV-202608-0001`
pub const INVOICE_PREFIX: &str = "INV";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BillingError {
    #[error("Discount must be between 0 and 100, got {0}")]
    InvalidDiscount(f64),

    #[error("Amount must be a positive finite number, got {0}")]
    InvalidAmount(f64),

    #[error("Payment of {amount} exceeds remaining balance of {remaining}")]
    ExceedsBalance { amount: f64, remaining: f64 },
}

pub type BillingResult<T> = Result<T, BillingError>;

/// Reject NaN, infinities and negatives
fn require_valid_amount(value: f64) -> BillingResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(BillingError::InvalidAmount(value));
    }
    Ok(value)
}

/// Gross amount after applying the percentage discount
pub fn discounted_balance(amount: f64, discount: f64) -> f64 {
    amount * (1.0 - discount / 100.0)
}

/// What the customer still owes
pub fn remaining_balance(amount: f64, discount: f64, paid_amount: f64) -> f64 {
    (discounted_balance(amount, discount) - paid_amount).max(0.0)
}

/// Validate a discount percentage (0..=100)
pub fn validate_discount(discount: f64) -> BillingResult<f64> {
    if !discount.is_finite() || !(0.0..=100.0).contains(&discount) {
        return Err(BillingError::InvalidDiscount(discount));
    }
    Ok(discount)
}

/// Validate a payment against the remaining balance.
///
/// Returns the new `paid_amount`. A payment may overshoot by at most
/// [`MONEY_TOLERANCE`].
pub fn record_payment(
    amount: f64,
    discount: f64,
    paid_amount: f64,
    payment: f64,
) -> BillingResult<f64> {
    require_valid_amount(payment)?;
    if payment <= 0.0 {
        return Err(BillingError::InvalidAmount(payment));
    }

    let remaining = remaining_balance(amount, discount, paid_amount);
    if payment > remaining + MONEY_TOLERANCE {
        return Err(BillingError::ExceedsBalance {
            amount: payment,
            remaining,
        });
    }

    Ok(paid_amount + payment)
}

/// Derive the invoice status from its money fields.
///
/// - nothing paid → `Unpaid`
/// - paid within tolerance of the discounted amount → `Paid`
/// - anything in between → `PartiallyPaid`
pub fn derive_status(amount: f64, discount: f64, paid_amount: f64) -> InvoiceStatus {
    if paid_amount <= MONEY_TOLERANCE {
        return InvoiceStatus::Unpaid;
    }
    if paid_amount + MONEY_TOLERANCE >= discounted_balance(amount, discount) {
        return InvoiceStatus::Paid;
    }
    InvoiceStatus::PartiallyPaid
}

/// `YYYYMM` prefix for a billing period
pub fn month_prefix(year: i32, month: u32) -> String {
    format!("{year}{month:02}")
}

/// Format an invoice number from a period and a sequence value
pub fn invoice_number(year: i32, month: u32, seq: i64) -> String {
    format!("{INVOICE_PREFIX}-{}-{seq:04}", month_prefix(year, month))
}

/// `YYYY-MM` period string
pub fn period_string(year: i32, month: u32) -> String {
    format!("{year}-{month:02}")
}

/// Parse a `YYYY-MM` period string
pub fn parse_period(period: &str) -> Option<(i32, u32)> {
    let (y, m) = period.split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if y.len() != 4 || m.len() != 2 || !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Round-robin distribution of `items` across `workers`, preserving item
/// order. Returns the worker index for each item; empty when there are no
/// workers.
pub fn round_robin_plan(items: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    (0..items).map(|i| i % workers).collect()
}
