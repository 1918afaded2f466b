//! Company Repository
//!
//! The company cash ledger is a singleton at `company:main`. First access
//! seeds the balance from payments already recorded on invoices, cashouts
//! are guarded inside a single transaction.

use super::{BaseRepository, RepoError, RepoResult, check_transaction};
use crate::db::models::{CashoutTransaction, Company};
use crate::ledger;
use crate::utils::time::now_ms;
use serde::Serialize;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

/// Fixed singleton key
const COMPANY_KEY: &str = "main";

/// Cashout history page with running totals
#[derive(Debug, Serialize)]
pub struct CashoutReport {
    pub transactions: Vec<CashoutTransaction>,
    /// Sum of every cashout ever recorded
    pub total_cashouts: f64,
    pub current_cash: f64,
}

/// Cashouts inside a date range
#[derive(Debug, Serialize)]
pub struct CashoutRangeReport {
    pub transactions: Vec<CashoutTransaction>,
    pub total_amount: f64,
    pub count: usize,
}

#[derive(Clone)]
pub struct CompanyRepository {
    base: BaseRepository,
}

impl CompanyRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn company_id() -> RecordId {
        RecordId::from_table_key("company", COMPANY_KEY)
    }

    /// Fetch the ledger, creating it on first access with a balance seeded
    /// from the discounted balances of all settled invoices.
    pub async fn get_or_init(&self) -> RepoResult<Company> {
        let existing: Option<Company> = self.base.db().select(Self::company_id()).await?;
        if let Some(company) = existing {
            return Ok(company);
        }

        let mut result = self
            .base
            .db()
            .query(
                "RETURN math::sum((SELECT VALUE amount * (1 - discount / 100) FROM invoice WHERE status = 'paid'))",
            )
            .await?;
        let seeded: Option<f64> = result.take(0)?;
        let seeded = seeded.unwrap_or(0.0);

        let now = now_ms();
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE $id SET
                    cash_balance = $balance,
                    cashouts = [],
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("id", Self::company_id()))
            .bind(("balance", seeded))
            .bind(("now", now))
            .await?;

        tracing::info!(balance = seeded, "Company ledger initialized");

        let created: Option<Company> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to initialize company ledger".to_string()))
    }

    /// Withdraw cash. The reason is mandatory (at least 3 characters) and
    /// the balance check runs inside the same transaction as the write.
    pub async fn cashout(
        &self,
        amount: f64,
        reason: &str,
        performed_by: RecordId,
        performed_by_name: &str,
    ) -> RepoResult<Company> {
        ledger::validate_amount(amount).map_err(|e| RepoError::Validation(e.to_string()))?;
        if reason.trim().len() < 3 {
            return Err(RepoError::Validation(
                "Cashout reason must be at least 3 characters".to_string(),
            ));
        }

        // Make sure the singleton exists before the guarded update
        self.get_or_init().await?;

        let tx = CashoutTransaction {
            amount,
            reason: reason.trim().to_string(),
            performed_by,
            performed_by_name: performed_by_name.to_string(),
            created_at: now_ms(),
        };

        let result = self
            .base
            .db()
            .query(
                r#"BEGIN TRANSACTION;
                LET $company = (SELECT * FROM ONLY $id);
                IF $company.cash_balance < $amount { THROW "insufficient_funds" };
                UPDATE $id SET
                    cash_balance -= $amount,
                    cashouts += [$tx],
                    updated_at = $now;
                COMMIT TRANSACTION;"#,
            )
            .bind(("id", Self::company_id()))
            .bind(("amount", amount))
            .bind(("tx", tx))
            .bind(("now", now_ms()))
            .await?;

        check_transaction(result, "insufficient_funds", "Insufficient company funds")?;

        self.get_or_init().await
    }

    /// Cashout history, newest first, capped at `limit`, with the all-time
    /// total and the current balance
    pub async fn cashout_report(&self, limit: usize) -> RepoResult<CashoutReport> {
        let company = self.get_or_init().await?;
        let total_cashouts = company.cashouts.iter().map(|c| c.amount).sum();
        let mut transactions = company.cashouts;
        transactions.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        transactions.truncate(limit);
        Ok(CashoutReport {
            transactions,
            total_cashouts,
            current_cash: company.cash_balance,
        })
    }

    /// Cashouts within `[start, end)` Unix millis, newest first
    pub async fn cashouts_in_range(&self, start: i64, end: i64) -> RepoResult<CashoutRangeReport> {
        let company = self.get_or_init().await?;
        let mut transactions = company.cashouts;
        transactions.retain(|c| c.created_at >= start && c.created_at < end);
        transactions.sort_by_key(|c| std::cmp::Reverse(c.created_at));
        let total_amount = transactions.iter().map(|c| c.amount).sum();
        let count = transactions.len();
        Ok(CashoutRangeReport {
            transactions,
            total_amount,
            count,
        })
    }
}
