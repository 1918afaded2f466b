//! Invoice Repository
//!
//! Numbering goes through the counter table (one counter per billing
//! month), status always comes from [`crate::billing::derive_status`].

use super::{BaseRepository, CounterRepository, RepoError, RepoResult, parse_id};
use crate::billing;
use crate::db::models::{
    Customer, Invoice, InvoiceCreate, InvoiceStatus, InvoiceUpdate, Service, User,
};
use crate::utils::time::{self, now_ms};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct InvoiceRepository {
    base: BaseRepository,
    counters: CounterRepository,
}

/// Outcome of a monthly generation run
#[derive(Debug, Clone, serde::Serialize)]
pub struct MonthlyRunSummary {
    pub period: String,
    pub generated: usize,
    pub skipped_no_service: usize,
    pub collectors: usize,
}

impl InvoiceRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            counters: CounterRepository::new(db.clone()),
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Invoice>> {
        let invoices: Vec<Invoice> = self
            .base
            .db()
            .query("SELECT * FROM invoice ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(invoices)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Invoice>> {
        let thing = parse_id(id, "invoice")?;
        let invoice: Option<Invoice> = self.base.db().select(thing).await?;
        Ok(invoice)
    }

    pub async fn find_by_number(&self, number: &str) -> RepoResult<Option<Invoice>> {
        let number_owned = number.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM invoice WHERE number = $number LIMIT 1")
            .bind(("number", number_owned))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices.into_iter().next())
    }

    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Invoice>> {
        let thing = parse_id(customer_id, "customer")?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM invoice WHERE customer = $customer ORDER BY created_at DESC")
            .bind(("customer", thing))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices)
    }

    /// Every invoice ever assigned to one collector
    pub async fn find_by_collector(&self, collector_id: &str) -> RepoResult<Vec<Invoice>> {
        let thing = parse_id(collector_id, "user")?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM invoice WHERE collector = $collector ORDER BY due_date")
            .bind(("collector", thing))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices)
    }

    /// Unsettled invoices carried by one collector
    pub async fn find_open_by_collector(&self, collector_id: &str) -> RepoResult<Vec<Invoice>> {
        let thing = parse_id(collector_id, "user")?;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM invoice WHERE collector = $collector AND status != 'paid' ORDER BY due_date",
            )
            .bind(("collector", thing))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices)
    }

    pub async fn find_by_status(&self, status: InvoiceStatus) -> RepoResult<Vec<Invoice>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM invoice WHERE status = $status ORDER BY due_date")
            .bind(("status", status))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices)
    }

    /// Unsettled invoices past their due date
    pub async fn find_overdue(&self) -> RepoResult<Vec<Invoice>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM invoice WHERE status != 'paid' AND due_date < $now ORDER BY due_date")
            .bind(("now", now_ms()))
            .await?;
        let invoices: Vec<Invoice> = result.take(0)?;
        Ok(invoices)
    }

    /// Create a single ad-hoc invoice
    pub async fn create(&self, data: InvoiceCreate) -> RepoResult<Invoice> {
        if !data.amount.is_finite() || data.amount <= 0.0 {
            return Err(RepoError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }

        let customer: Option<Customer> = self.base.db().select(data.customer.clone()).await?;
        let customer =
            customer.ok_or_else(|| RepoError::NotFound(format!("Customer {}", data.customer)))?;

        let service: Option<Service> = self.base.db().select(customer.service.clone()).await?;
        if service.is_none() {
            return Err(RepoError::Validation(format!(
                "Service {} not found",
                customer.service
            )));
        }

        // A supplied collector must be an active user holding the Collector role
        if let Some(ref collector) = data.collector {
            self.require_collector(&collector.to_string()).await?;
        }
        let collector = data.collector;

        let (year, month) = match data.period.as_deref() {
            Some(p) => billing::parse_period(p)
                .ok_or_else(|| RepoError::Validation(format!("Invalid period: {p}")))?,
            None => time::current_year_month(),
        };

        self.create_one(&customer, collector, year, month, data.amount)
            .await
    }

    async fn create_one(
        &self,
        customer: &Customer,
        collector: Option<surrealdb::RecordId>,
        year: i32,
        month: u32,
        amount: f64,
    ) -> RepoResult<Invoice> {
        let prefix = billing::month_prefix(year, month);
        let seq = self.counters.next(&format!("invoice_{prefix}")).await?;
        let number = billing::invoice_number(year, month, seq);
        let due_date = time::due_date_millis(year, month)
            .map_err(|e| RepoError::Validation(e.to_string()))?;
        let now = now_ms();

        let customer_id = customer
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Customer record has no id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE invoice SET
                    number = $number,
                    customer = $customer,
                    service = $service,
                    collector = $collector,
                    period = $period,
                    amount = $amount,
                    discount = 0.0,
                    paid_amount = 0.0,
                    status = 'unpaid',
                    due_date = $due_date,
                    created_at = $now,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("number", number))
            .bind(("customer", customer_id))
            .bind(("service", customer.service.clone()))
            .bind(("collector", collector))
            .bind(("period", billing::period_string(year, month)))
            .bind(("amount", amount))
            .bind(("due_date", due_date))
            .bind(("now", now))
            .await?;

        let created: Option<Invoice> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create invoice".to_string()))
    }

    /// Generate the monthly batch: one invoice per active customer, priced
    /// by their service plan, distributed round-robin across active
    /// collectors.
    ///
    /// Rejects the run when any invoice for the period already exists, and
    /// when either the customer or the collector pool is empty.
    pub async fn generate_monthly(&self, year: i32, month: u32) -> RepoResult<MonthlyRunSummary> {
        if !(1..=12).contains(&month) {
            return Err(RepoError::Validation(format!("Invalid month: {month}")));
        }
        let period = billing::period_string(year, month);

        let period_owned = period.clone();
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS c FROM invoice WHERE period = $period GROUP ALL")
            .bind(("period", period_owned))
            .await?;
        let counts: Vec<serde_json::Value> = result.take(0)?;
        let existing = counts
            .first()
            .and_then(|v| v.get("c"))
            .and_then(|c| c.as_i64())
            .unwrap_or(0);
        if existing > 0 {
            return Err(RepoError::Conflict(format!(
                "Invoices for period {} already generated",
                period
            )));
        }

        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE is_active = true ORDER BY created_at")
            .await?
            .take(0)?;
        if customers.is_empty() {
            return Err(RepoError::NotFound("No active customers found".to_string()));
        }

        let collectors: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE role.name = 'Collector' AND is_active = true ORDER BY created_at")
            .await?
            .take(0)?;

        let collector_ids: Vec<surrealdb::RecordId> =
            collectors.iter().filter_map(|u| u.id.clone()).collect();
        if collector_ids.is_empty() {
            return Err(RepoError::NotFound(
                "No active collectors found".to_string(),
            ));
        }
        let plan = billing::round_robin_plan(customers.len(), collector_ids.len());

        let mut generated = 0usize;
        let mut skipped_no_service = 0usize;

        for (i, customer) in customers.iter().enumerate() {
            let service: Option<Service> =
                self.base.db().select(customer.service.clone()).await?;
            let Some(service) = service else {
                tracing::warn!(
                    customer = %customer.name,
                    "Skipping customer with dangling service reference"
                );
                skipped_no_service += 1;
                continue;
            };

            let collector = plan.get(i).map(|&w| collector_ids[w].clone());

            self.create_one(customer, collector, year, month, service.price)
                .await?;
            generated += 1;
        }

        tracing::info!(%period, generated, "Monthly invoice run complete");

        Ok(MonthlyRunSummary {
            period,
            generated,
            skipped_no_service,
            collectors: collector_ids.len(),
        })
    }

    /// Administrative update: move the invoice to another collector or shift
    /// the due date
    pub async fn update(&self, id: &str, data: InvoiceUpdate) -> RepoResult<Invoice> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))?;

        if let Some(ref collector) = data.collector {
            self.require_collector(&collector.to_string()).await?;
        }
        if let Some(due) = data.due_date
            && due <= 0
        {
            return Err(RepoError::Validation(
                "Due date must be a positive timestamp".to_string(),
            ));
        }

        let thing = parse_id(id, "invoice")?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    collector = IF $has_collector THEN $collector ELSE collector END,
                    due_date = $due_date OR due_date,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("has_collector", data.collector.is_some()))
            .bind(("collector", data.collector))
            .bind(("due_date", data.due_date))
            .bind(("now", now_ms()))
            .await?;

        result
            .take::<Option<Invoice>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))
    }

    /// Apply a percentage discount. Settled invoices are immutable.
    pub async fn apply_discount(&self, id: &str, discount: f64) -> RepoResult<Invoice> {
        billing::validate_discount(discount)
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let invoice = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))?;

        if invoice.status == InvoiceStatus::Paid {
            return Err(RepoError::Conflict(
                "Cannot change discount on a settled invoice".to_string(),
            ));
        }
        // A discount below what is already paid would make the invoice overpaid
        if invoice.paid_amount
            > billing::discounted_balance(invoice.amount, discount) + billing::MONEY_TOLERANCE
        {
            return Err(RepoError::Conflict(
                "Discount would drop the total below the amount already paid".to_string(),
            ));
        }

        let status = billing::derive_status(invoice.amount, discount, invoice.paid_amount);
        self.write_money_fields(id, discount, invoice.paid_amount, status)
            .await
    }

    /// Reset the discount to zero
    pub async fn remove_discount(&self, id: &str) -> RepoResult<Invoice> {
        let invoice = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))?;

        if invoice.status == InvoiceStatus::Paid {
            return Err(RepoError::Conflict(
                "Cannot change discount on a settled invoice".to_string(),
            ));
        }

        let status = billing::derive_status(invoice.amount, 0.0, invoice.paid_amount);
        self.write_money_fields(id, 0.0, invoice.paid_amount, status)
            .await
    }

    /// Record an office payment against the invoice
    pub async fn make_payment(&self, id: &str, payment: f64) -> RepoResult<Invoice> {
        let invoice = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))?;

        let paid_amount =
            billing::record_payment(invoice.amount, invoice.discount, invoice.paid_amount, payment)
                .map_err(|e| match e {
                    billing::BillingError::ExceedsBalance { .. } => {
                        RepoError::Conflict(e.to_string())
                    }
                    _ => RepoError::Validation(e.to_string()),
                })?;

        let status = billing::derive_status(invoice.amount, invoice.discount, paid_amount);
        self.write_money_fields(id, invoice.discount, paid_amount, status)
            .await
    }

    async fn write_money_fields(
        &self,
        id: &str,
        discount: f64,
        paid_amount: f64,
        status: InvoiceStatus,
    ) -> RepoResult<Invoice> {
        let thing = parse_id(id, "invoice")?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    discount = $discount,
                    paid_amount = $paid_amount,
                    status = $status,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("discount", discount))
            .bind(("paid_amount", paid_amount))
            .bind(("status", status))
            .bind(("now", now_ms()))
            .await?;

        result
            .take::<Option<Invoice>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))
    }

    /// Delete an invoice. Invoices with recorded payments stay for the books.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Invoice {} not found", id)))?;
        if existing.paid_amount > 0.0 {
            return Err(RepoError::Conflict(
                "Invoices with recorded payments cannot be deleted".to_string(),
            ));
        }

        let thing = parse_id(id, "invoice")?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Verify a user id refers to an active Collector
    pub async fn require_collector(&self, user_id: &str) -> RepoResult<User> {
        let thing = parse_id(user_id, "user")?;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE id = $id AND role.name = 'Collector' AND is_active = true LIMIT 1",
            )
            .bind(("id", thing))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users.into_iter().next().ok_or_else(|| {
            RepoError::Validation(format!("User {} is not an active collector", user_id))
        })
    }
}
