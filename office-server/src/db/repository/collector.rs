//! Collector Repository
//!
//! Collector cash ledgers. Balance records live at the deterministic id
//! `collector_balance:<collector key>` so receive/pay can UPSERT them
//! inside a transaction without a prior read.
//!
//! The two money movements are dual-ledger writes (collector balance +
//! company cash) and run as single SurrealDB transactions, as does the
//! bulk invoice reassignment.

use super::{BaseRepository, CompanyRepository, RepoError, RepoResult, check_transaction, parse_id};
use crate::db::models::{
    CollectorBalance, CollectorTransaction, Customer, TransactionType, User,
};
use crate::ledger::{self, Currency};
use crate::utils::time::now_ms;
use serde::Serialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct CollectorRepository {
    base: BaseRepository,
    company: CompanyRepository,
}

/// One collector with their current per-currency balances
#[derive(Debug, Clone, Serialize)]
pub struct CollectorOverview {
    pub collector: User,
    pub lbp_balance: f64,
    pub usd_balance: f64,
}

/// Active customers partitioned by a collector's unpaid invoices
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOverview {
    pub all_customers: Vec<Customer>,
    pub assigned_customers: Vec<Customer>,
    pub unassigned_customers: Vec<Customer>,
}

/// Filters for the transaction listing
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub tx_type: Option<TransactionType>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl CollectorRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            company: CompanyRepository::new(db.clone()),
            base: BaseRepository::new(db),
        }
    }

    fn balance_id(collector: &RecordId) -> RecordId {
        RecordId::from_table_key("collector_balance", collector.key().to_string())
    }

    /// All active collectors with their balances
    pub async fn list(&self) -> RepoResult<Vec<CollectorOverview>> {
        let collectors: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE role.name = 'Collector' AND is_active = true ORDER BY first_name")
            .await?
            .take(0)?;

        let mut overview = Vec::with_capacity(collectors.len());
        for collector in collectors {
            let (lbp_balance, usd_balance) = match &collector.id {
                Some(id) => self.balances_for(id).await?,
                None => (0.0, 0.0),
            };
            overview.push(CollectorOverview {
                collector,
                lbp_balance,
                usd_balance,
            });
        }
        Ok(overview)
    }

    /// Current (LBP, USD) balances of a collector, zeros when no ledger
    /// record exists yet
    pub async fn balances_for(&self, collector: &RecordId) -> RepoResult<(f64, f64)> {
        let balance: Option<CollectorBalance> =
            self.base.db().select(Self::balance_id(collector)).await?;
        Ok(balance
            .map(|b| (b.lbp_balance, b.usd_balance))
            .unwrap_or((0.0, 0.0)))
    }

    /// Cash handed over by a collector: subtract from their balance in the
    /// transaction currency and add the LBP equivalent to company cash.
    /// Collector balances may go negative, so there is no floor check here.
    pub async fn receive(
        &self,
        collector_id: &str,
        amount: f64,
        currency: Currency,
        usd_rate: f64,
        description: Option<String>,
        admin: &RecordId,
    ) -> RepoResult<CollectorTransaction> {
        ledger::validate_amount(amount).map_err(|e| RepoError::Validation(e.to_string()))?;
        let collector_rid = self.require_collector_id(collector_id).await?;
        let cash_delta = ledger::lbp_equivalent(amount, currency, usd_rate);
        let now = now_ms();

        // The company singleton must exist before the transactional update
        self.company.get_or_init().await?;

        let tx = CollectorTransaction {
            id: None,
            collector: collector_rid.clone(),
            tx_type: TransactionType::Received,
            amount,
            currency,
            description,
            processed_by: admin.clone(),
            created_at: now,
        };

        // Field names cannot be bound, so the per-currency statement is
        // picked here
        let query = match currency {
            Currency::Lbp => {
                r#"BEGIN TRANSACTION;
                UPSERT $balance_id SET
                    collector = $collector,
                    lbp_balance -= $amount,
                    usd_balance += 0,
                    updated_at = $now;
                UPDATE $company_id SET
                    cash_balance += $cash_delta,
                    updated_at = $now;
                CREATE collector_transaction CONTENT $tx;
                COMMIT TRANSACTION;"#
            }
            Currency::Usd => {
                r#"BEGIN TRANSACTION;
                UPSERT $balance_id SET
                    collector = $collector,
                    lbp_balance += 0,
                    usd_balance -= $amount,
                    updated_at = $now;
                UPDATE $company_id SET
                    cash_balance += $cash_delta,
                    updated_at = $now;
                CREATE collector_transaction CONTENT $tx;
                COMMIT TRANSACTION;"#
            }
        };

        let result = self
            .base
            .db()
            .query(query)
            .bind(("balance_id", Self::balance_id(&collector_rid)))
            .bind(("collector", collector_rid.clone()))
            .bind(("company_id", RecordId::from_table_key("company", "main")))
            .bind(("amount", amount))
            .bind(("cash_delta", cash_delta))
            .bind(("tx", tx.clone()))
            .bind(("now", now))
            .await?;

        result
            .check()
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(tx)
    }

    /// Cash paid out to a collector: company cash covers the LBP
    /// equivalent, the collector balance grows in the transaction currency.
    pub async fn pay(
        &self,
        collector_id: &str,
        amount: f64,
        currency: Currency,
        usd_rate: f64,
        description: Option<String>,
        admin: &RecordId,
    ) -> RepoResult<CollectorTransaction> {
        ledger::validate_amount(amount).map_err(|e| RepoError::Validation(e.to_string()))?;
        let collector_rid = self.require_collector_id(collector_id).await?;
        let cash_delta = ledger::lbp_equivalent(amount, currency, usd_rate);
        let now = now_ms();

        self.company.get_or_init().await?;

        let tx = CollectorTransaction {
            id: None,
            collector: collector_rid.clone(),
            tx_type: TransactionType::Paid,
            amount,
            currency,
            description,
            processed_by: admin.clone(),
            created_at: now,
        };

        let query = match currency {
            Currency::Lbp => {
                r#"BEGIN TRANSACTION;
                LET $cash = (SELECT VALUE cash_balance FROM ONLY $company_id);
                IF $cash = NONE OR $cash < $cash_delta { THROW "insufficient_funds" };
                UPDATE $company_id SET
                    cash_balance -= $cash_delta,
                    updated_at = $now;
                UPSERT $balance_id SET
                    collector = $collector,
                    lbp_balance += $amount,
                    usd_balance += 0,
                    updated_at = $now;
                CREATE collector_transaction CONTENT $tx;
                COMMIT TRANSACTION;"#
            }
            Currency::Usd => {
                r#"BEGIN TRANSACTION;
                LET $cash = (SELECT VALUE cash_balance FROM ONLY $company_id);
                IF $cash = NONE OR $cash < $cash_delta { THROW "insufficient_funds" };
                UPDATE $company_id SET
                    cash_balance -= $cash_delta,
                    updated_at = $now;
                UPSERT $balance_id SET
                    collector = $collector,
                    lbp_balance += 0,
                    usd_balance += $amount,
                    updated_at = $now;
                CREATE collector_transaction CONTENT $tx;
                COMMIT TRANSACTION;"#
            }
        };

        let result = self
            .base
            .db()
            .query(query)
            .bind(("balance_id", Self::balance_id(&collector_rid)))
            .bind(("collector", collector_rid.clone()))
            .bind(("company_id", RecordId::from_table_key("company", "main")))
            .bind(("amount", amount))
            .bind(("cash_delta", cash_delta))
            .bind(("tx", tx.clone()))
            .bind(("now", now))
            .await?;

        check_transaction(
            result,
            "insufficient_funds",
            "Insufficient company cash for this payment",
        )?;

        Ok(tx)
    }

    /// One collector's transaction stream, newest first, capped at 100 rows
    pub async fn transactions(
        &self,
        collector_id: &str,
        filter: TransactionFilter,
    ) -> RepoResult<Vec<CollectorTransaction>> {
        let collector = parse_id(collector_id, "user")?;

        let mut result = self
            .base
            .db()
            .query(
                r#"SELECT * FROM collector_transaction
                    WHERE collector = $collector
                    AND ($tx_type = NONE OR tx_type = $tx_type)
                    AND ($from = NONE OR created_at >= $from)
                    AND ($to = NONE OR created_at < $to)
                    ORDER BY created_at DESC
                    LIMIT 100"#,
            )
            .bind(("collector", collector))
            .bind(("tx_type", filter.tx_type))
            .bind(("from", filter.from))
            .bind(("to", filter.to))
            .await?;
        let transactions: Vec<CollectorTransaction> = result.take(0)?;
        Ok(transactions)
    }

    /// Active customers split into assigned/unassigned for one collector.
    /// A customer counts as assigned when the collector holds one of their
    /// unpaid invoices.
    pub async fn assignments(&self, collector_id: &str) -> RepoResult<AssignmentOverview> {
        let collector = self.require_collector_id(collector_id).await?;

        let all_customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;

        let assigned_ids: Vec<RecordId> = self
            .base
            .db()
            .query(
                "SELECT VALUE customer FROM invoice WHERE collector = $collector AND status != 'paid'",
            )
            .bind(("collector", collector))
            .await?
            .take(0)?;

        let (assigned_customers, unassigned_customers): (Vec<Customer>, Vec<Customer>) =
            all_customers
                .iter()
                .cloned()
                .partition(|c| c.id.as_ref().is_some_and(|id| assigned_ids.contains(id)));

        Ok(AssignmentOverview {
            all_customers,
            assigned_customers,
            unassigned_customers,
        })
    }

    /// Replace a collector's customer assignments: clear the collector from
    /// every unpaid invoice, then attach them to the unpaid invoices of the
    /// requested customers. Both bulk updates run in one transaction.
    pub async fn set_assignments(
        &self,
        collector_id: &str,
        customer_ids: &[String],
    ) -> RepoResult<usize> {
        let collector = self.require_collector_id(collector_id).await?;

        let mut customers = Vec::with_capacity(customer_ids.len());
        for id in customer_ids {
            customers.push(parse_id(id, "customer")?);
        }

        let result = self
            .base
            .db()
            .query(
                r#"BEGIN TRANSACTION;
                UPDATE invoice SET collector = NONE
                    WHERE collector = $collector AND status != 'paid';
                UPDATE invoice SET collector = $collector
                    WHERE customer IN $customers AND status != 'paid';
                COMMIT TRANSACTION;"#,
            )
            .bind(("collector", collector))
            .bind(("customers", customers))
            .await?;

        result
            .check()
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(customer_ids.len())
    }

    async fn require_collector_id(&self, user_id: &str) -> RepoResult<RecordId> {
        let thing = parse_id(user_id, "user")?;
        let users: Vec<User> = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE id = $id AND role.name = 'Collector' AND is_active = true LIMIT 1",
            )
            .bind(("id", thing))
            .await?
            .take(0)?;
        users
            .into_iter()
            .next()
            .and_then(|u| u.id)
            .ok_or_else(|| {
                RepoError::Validation(format!("User {} is not an active collector", user_id))
            })
    }
}
