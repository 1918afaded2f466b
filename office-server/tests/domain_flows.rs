//! End-to-end domain flows against the in-memory engine: monthly invoice
//! runs, payments and discounts, collector/company ledgers, task lifecycle.
//! Run: cargo test -p office-server --test domain_flows

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use office_server::db::DbService;
use office_server::db::models::{
    CategoryCreate, Customer, CustomerCreate, InvoiceStatus, InvoiceUpdate, RoleCreate,
    ServiceCreate, TaskCreate, TaskPriority, TaskStage, TransactionType, UserCreate, ZoneCreate,
};
use office_server::db::repository::{
    CategoryRepository, CollectorRepository, CompanyRepository, CustomerRepository,
    InvoiceRepository, RepoError, RoleRepository, ServiceRepository, TaskRepository,
    UserRepository, ZoneRepository,
};
use office_server::ledger::Currency;

const USD_RATE: f64 = 90_000.0;

static PHONE_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

async fn test_db() -> Surreal<Db> {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("office").use_db("main").await.unwrap();
    DbService::from_db(db.clone()).await.unwrap();
    db
}

async fn seed_role(db: &Surreal<Db>, name: &str) -> String {
    let role = RoleRepository::new(db.clone())
        .create(RoleCreate {
            name: name.to_string(),
            description: None,
        })
        .await
        .unwrap();
    role.id.unwrap().to_string()
}

async fn seed_user(db: &Surreal<Db>, email: &str, role_id: &str) -> String {
    let user = UserRepository::new(db.clone())
        .create(UserCreate {
            first_name: "Test".to_string(),
            last_name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            phone_number: format!(
                "+96171{:06}",
                PHONE_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            ),
            address: "Beirut".to_string(),
            password: "secret123".to_string(),
            role: role_id.parse().unwrap(),
        })
        .await
        .unwrap();
    user.id.unwrap().to_string()
}

/// Seed a zone, a service plan priced in LBP, and `n` active customers.
async fn seed_customers(db: &Surreal<Db>, price: f64, n: usize) -> Vec<Customer> {
    let zone = ZoneRepository::new(db.clone())
        .create(ZoneCreate {
            name: "Hamra".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let service = ServiceRepository::new(db.clone())
        .create(ServiceCreate {
            name: "Fiber 50".to_string(),
            price,
            description: None,
        })
        .await
        .unwrap();

    let repo = CustomerRepository::new(db.clone());
    let mut customers = Vec::with_capacity(n);
    for i in 0..n {
        let customer = repo
            .create(CustomerCreate {
                name: format!("Customer {i}"),
                phone_number: format!("+96170{:06}", i),
                location: format!("Hamra, Street {i}"),
                zone: zone.id.clone().unwrap(),
                service: service.id.clone().unwrap(),
                notes: None,
            })
            .await
            .unwrap();
        customers.push(customer);
    }
    customers
}

#[tokio::test]
async fn monthly_run_distributes_round_robin() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let c1 = seed_user(&db, "c1@test.com", &role).await;
    let c2 = seed_user(&db, "c2@test.com", &role).await;
    seed_customers(&db, 500_000.0, 4).await;

    let repo = InvoiceRepository::new(db.clone());
    let summary = repo.generate_monthly(2026, 3).await.unwrap();

    assert_eq!(summary.period, "2026-03");
    assert_eq!(summary.generated, 4);
    assert_eq!(summary.skipped_no_service, 0);
    assert_eq!(summary.collectors, 2);

    let invoices = repo.find_all().await.unwrap();
    assert_eq!(invoices.len(), 4);
    for invoice in &invoices {
        assert_eq!(invoice.amount, 500_000.0);
        assert_eq!(invoice.discount, 0.0);
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert!(invoice.number.starts_with("INV-202603-"));
        assert!(invoice.due_date > 0);
    }

    // Two collectors, four customers, two invoices each
    let for_c1 = repo.find_by_collector(&c1).await.unwrap();
    let for_c2 = repo.find_by_collector(&c2).await.unwrap();
    assert_eq!(for_c1.len(), 2);
    assert_eq!(for_c2.len(), 2);
}

#[tokio::test]
async fn monthly_run_rejects_duplicates_and_empty_pools() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;

    let repo = InvoiceRepository::new(db.clone());

    // Month out of range
    let err = repo.generate_monthly(2026, 13).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");

    // No customers yet
    let err = repo.generate_monthly(2026, 4).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got {err:?}");

    seed_customers(&db, 300_000.0, 2).await;

    // Customers but no collector users
    let err = repo.generate_monthly(2026, 4).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got {err:?}");

    seed_user(&db, "c1@test.com", &role).await;
    repo.generate_monthly(2026, 4).await.unwrap();

    // Second run for the same period
    let err = repo.generate_monthly(2026, 4).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn discount_then_payment_settles_invoice() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    seed_user(&db, "c1@test.com", &role).await;
    seed_customers(&db, 100.0, 1).await;

    let repo = InvoiceRepository::new(db.clone());
    repo.generate_monthly(2026, 6).await.unwrap();
    let invoice = repo.find_all().await.unwrap().remove(0);
    let id = invoice.id.unwrap().to_string();

    let discounted = repo.apply_discount(&id, 10.0).await.unwrap();
    assert_eq!(discounted.discount, 10.0);
    assert_eq!(discounted.status, InvoiceStatus::Unpaid);

    // 10% off 100 leaves 90 payable
    let paid = repo.make_payment(&id, 90.0).await.unwrap();
    assert_eq!(paid.paid_amount, 90.0);
    assert_eq!(paid.status, InvoiceStatus::Paid);

    // Settled invoices take no further money and no discount changes
    let err = repo.make_payment(&id, 1.0).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");
    let err = repo.apply_discount(&id, 5.0).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn partial_payment_marks_partially_paid() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    seed_user(&db, "c1@test.com", &role).await;
    seed_customers(&db, 100.0, 1).await;

    let repo = InvoiceRepository::new(db.clone());
    repo.generate_monthly(2026, 7).await.unwrap();
    let invoice = repo.find_all().await.unwrap().remove(0);
    let id = invoice.id.unwrap().to_string();

    let paid = repo.make_payment(&id, 40.0).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(paid.paid_amount, 40.0);

    // Overpayment beyond the remaining 60 is rejected and changes nothing
    let err = repo.make_payment(&id, 61.0).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");
    let unchanged = repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(unchanged.paid_amount, 40.0);
    assert_eq!(unchanged.status, InvoiceStatus::PartiallyPaid);
}

#[tokio::test]
async fn receive_moves_cash_from_collector_to_company() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let admin_role = seed_role(&db, "Admin").await;
    let collector = seed_user(&db, "cash@test.com", &role).await;
    let admin: RecordId = seed_user(&db, "boss@test.com", &admin_role)
        .await
        .parse()
        .unwrap();

    let repo = CollectorRepository::new(db.clone());
    let tx = repo
        .receive(&collector, 100.0, Currency::Usd, USD_RATE, None, &admin)
        .await
        .unwrap();
    assert_eq!(tx.tx_type, TransactionType::Received);
    assert_eq!(tx.amount, 100.0);

    // USD balance drops by the received amount, company cash grows by the
    // LBP equivalent at the configured rate
    let (lbp, usd) = repo
        .balances_for(&collector.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(lbp, 0.0);
    assert_eq!(usd, -100.0);

    let company = CompanyRepository::new(db.clone()).get_or_init().await.unwrap();
    assert_eq!(company.cash_balance, 9_000_000.0);
}

#[tokio::test]
async fn pay_requires_company_cash() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let admin_role = seed_role(&db, "Admin").await;
    let collector = seed_user(&db, "till@test.com", &role).await;
    let admin: RecordId = seed_user(&db, "boss@test.com", &admin_role)
        .await
        .parse()
        .unwrap();

    let repo = CollectorRepository::new(db.clone());

    // Nothing in the till yet
    let err = repo
        .pay(&collector, 1_000.0, Currency::Lbp, USD_RATE, None, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

    repo.receive(&collector, 2_000_000.0, Currency::Lbp, USD_RATE, None, &admin)
        .await
        .unwrap();

    repo.pay(&collector, 1_500_000.0, Currency::Lbp, USD_RATE, None, &admin)
        .await
        .unwrap();

    // Received 2M (balance -2M), paid back 1.5M (balance +1.5M)
    let (lbp, usd) = repo
        .balances_for(&collector.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(lbp, -500_000.0);
    assert_eq!(usd, 0.0);

    let company = CompanyRepository::new(db.clone()).get_or_init().await.unwrap();
    assert_eq!(company.cash_balance, 500_000.0);

    let history = repo
        .transactions(&collector, Default::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    // Newest first
    assert_eq!(history[0].tx_type, TransactionType::Paid);
    assert_eq!(history[1].tx_type, TransactionType::Received);
}

#[tokio::test]
async fn cashout_requires_reason_and_funds() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let admin_role = seed_role(&db, "Admin").await;
    let collector = seed_user(&db, "till@test.com", &role).await;
    let admin: RecordId = seed_user(&db, "boss@test.com", &admin_role)
        .await
        .parse()
        .unwrap();

    CollectorRepository::new(db.clone())
        .receive(&collector, 1_000_000.0, Currency::Lbp, USD_RATE, None, &admin)
        .await
        .unwrap();

    let repo = CompanyRepository::new(db.clone());

    let err = repo
        .cashout(100.0, "ab", admin.clone(), "Boss")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");

    let err = repo
        .cashout(2_000_000.0, "rent", admin.clone(), "Boss")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

    let company = repo
        .cashout(400_000.0, "office rent", admin.clone(), "Boss")
        .await
        .unwrap();
    assert_eq!(company.cash_balance, 600_000.0);
    assert_eq!(company.cashouts.len(), 1);
    assert_eq!(company.cashouts[0].reason, "office rent");

    repo.cashout(100_000.0, "fuel", admin, "Boss").await.unwrap();

    // Limit caps the page, totals keep counting everything
    let report = repo.cashout_report(1).await.unwrap();
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.total_cashouts, 500_000.0);
    assert_eq!(report.current_cash, 500_000.0);

    let report = repo.cashout_report(50).await.unwrap();
    assert_eq!(report.transactions.len(), 2);

    let range = repo.cashouts_in_range(0, i64::MAX).await.unwrap();
    assert_eq!(range.count, 2);
    assert_eq!(range.total_amount, 500_000.0);

    let empty = repo.cashouts_in_range(0, 1).await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.total_amount, 0.0);
}

#[tokio::test]
async fn company_cash_seeds_from_settled_invoices() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    seed_user(&db, "c1@test.com", &role).await;
    seed_customers(&db, 100.0, 1).await;

    let invoices = InvoiceRepository::new(db.clone());
    invoices.generate_monthly(2026, 8).await.unwrap();
    let invoice = invoices.find_all().await.unwrap().remove(0);
    let id = invoice.id.unwrap().to_string();
    invoices.apply_discount(&id, 10.0).await.unwrap();
    invoices.make_payment(&id, 90.0).await.unwrap();

    // First access sums the discounted balances of paid invoices
    let company = CompanyRepository::new(db.clone()).get_or_init().await.unwrap();
    assert_eq!(company.cash_balance, 90.0);
}

#[tokio::test]
async fn technician_holds_one_active_task_at_a_time() {
    let db = test_db().await;
    let tech_role = seed_role(&db, "Technician").await;
    let tech = seed_user(&db, "tech@test.com", &tech_role).await;
    let customers = seed_customers(&db, 100.0, 2).await;

    let category = CategoryRepository::new(db.clone())
        .create(CategoryCreate {
            name: "Installation".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let repo = TaskRepository::new(db.clone());
    let mut ids = Vec::new();
    for customer in &customers {
        let task = repo
            .create(TaskCreate {
                customer: customer.id.clone().unwrap(),
                category: category.id.clone().unwrap(),
                description: "Install router".to_string(),
                priority: TaskPriority::Medium,
                assignee: None,
            })
            .await
            .unwrap();
        ids.push(task.id.clone().unwrap().to_string());
    }

    repo.assign(&ids[0], &tech).await.unwrap();
    let accepted = repo.accept(&ids[0], &tech).await.unwrap();
    assert_eq!(accepted.stage, TaskStage::Accepted);

    // Second accept while the first is still accepted
    repo.assign(&ids[1], &tech).await.unwrap();
    let err = repo.accept(&ids[1], &tech).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

    // Finish the first, then the second goes through
    repo.advance(&ids[0], &tech, TaskStage::Arrived).await.unwrap();
    let done = repo.advance(&ids[0], &tech, TaskStage::Completed).await.unwrap();
    assert_eq!(done.stage, TaskStage::Completed);
    assert!(done.finished_at.is_some());

    let accepted = repo.accept(&ids[1], &tech).await.unwrap();
    assert_eq!(accepted.stage, TaskStage::Accepted);

    let ongoing = repo.find_ongoing_for(&tech).await.unwrap();
    assert_eq!(ongoing.len(), 1);
}

#[tokio::test]
async fn accept_conflicts_while_another_task_is_assigned() {
    let db = test_db().await;
    let tech_role = seed_role(&db, "Technician").await;
    let tech = seed_user(&db, "assigned@test.com", &tech_role).await;
    let customers = seed_customers(&db, 100.0, 2).await;

    let category = CategoryRepository::new(db.clone())
        .create(CategoryCreate {
            name: "Maintenance".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let repo = TaskRepository::new(db.clone());
    let mut ids = Vec::new();
    for customer in &customers {
        let task = repo
            .create(TaskCreate {
                customer: customer.id.clone().unwrap(),
                category: category.id.clone().unwrap(),
                description: "Check line".to_string(),
                priority: TaskPriority::Low,
                assignee: None,
            })
            .await
            .unwrap();
        let id = task.id.clone().unwrap().to_string();
        repo.assign(&id, &tech).await.unwrap();
        ids.push(id);
    }

    // A second task still in Assigned occupies the active slot
    let err = repo.accept(&ids[0], &tech).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

    // Both assigned tasks count as ongoing
    let ongoing = repo.find_ongoing_for(&tech).await.unwrap();
    assert_eq!(ongoing.len(), 2);

    // Cancelling the other frees the slot
    repo.cancel(&ids[1]).await.unwrap();
    let accepted = repo.accept(&ids[0], &tech).await.unwrap();
    assert_eq!(accepted.stage, TaskStage::Accepted);
}

#[tokio::test]
async fn pre_assigned_task_is_accepted_straight_from_pending() {
    let db = test_db().await;
    let tech_role = seed_role(&db, "Technician").await;
    let tech = seed_user(&db, "pickup@test.com", &tech_role).await;
    let customers = seed_customers(&db, 100.0, 1).await;

    let category = CategoryRepository::new(db.clone())
        .create(CategoryCreate {
            name: "Survey".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let repo = TaskRepository::new(db.clone());
    let task = repo
        .create(TaskCreate {
            customer: customers[0].id.clone().unwrap(),
            category: category.id.unwrap(),
            description: "Site survey".to_string(),
            priority: TaskPriority::Low,
            assignee: Some(tech.parse().unwrap()),
        })
        .await
        .unwrap();
    assert_eq!(task.stage, TaskStage::Pending);
    let id = task.id.unwrap().to_string();

    // Pre-assigned tickets show up in the technician's list before accept
    let visible = repo.find_for_assignee(&tech, None).await.unwrap();
    assert_eq!(visible.len(), 1);

    let accepted = repo.accept(&id, &tech).await.unwrap();
    assert_eq!(accepted.stage, TaskStage::Accepted);
}

#[tokio::test]
async fn task_stage_machine_rejects_skips() {
    let db = test_db().await;
    let tech_role = seed_role(&db, "Technician").await;
    let tech = seed_user(&db, "skips@test.com", &tech_role).await;
    let customers = seed_customers(&db, 100.0, 1).await;

    let category = CategoryRepository::new(db.clone())
        .create(CategoryCreate {
            name: "Repair".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let repo = TaskRepository::new(db.clone());
    let task = repo
        .create(TaskCreate {
            customer: customers[0].id.clone().unwrap(),
            category: category.id.unwrap(),
            description: "No signal".to_string(),
            priority: TaskPriority::High,
            assignee: None,
        })
        .await
        .unwrap();
    let id = task.id.unwrap().to_string();
    repo.assign(&id, &tech).await.unwrap();

    // Completed straight from assigned is not a legal move
    let err = repo.advance(&id, &tech, TaskStage::Completed).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");

    repo.accept(&id, &tech).await.unwrap();
    let cancelled = repo.cancel_by_assignee(&id, &tech).await.unwrap();
    assert_eq!(cancelled.stage, TaskStage::Cancelled);

    // Terminal tasks are frozen
    let err = repo
        .add_comment(&id, &tech, "Tech", "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn collector_views_split_open_and_settled_invoices() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let collector = seed_user(&db, "split@test.com", &role).await;
    seed_customers(&db, 100.0, 2).await;

    let repo = InvoiceRepository::new(db.clone());
    repo.generate_monthly(2026, 10).await.unwrap();

    let all = repo.find_by_collector(&collector).await.unwrap();
    assert_eq!(all.len(), 2);

    let id = all[0].id.clone().unwrap().to_string();
    repo.make_payment(&id, 100.0).await.unwrap();

    // The settled invoice leaves the collection round but stays on the books
    let open = repo.find_open_by_collector(&collector).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(repo.find_by_collector(&collector).await.unwrap().len(), 2);
}

#[tokio::test]
async fn invoice_update_moves_collector_and_due_date() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let c1 = seed_user(&db, "first@test.com", &role).await;
    let c2 = seed_user(&db, "second@test.com", &role).await;
    seed_customers(&db, 100.0, 1).await;

    let repo = InvoiceRepository::new(db.clone());
    repo.generate_monthly(2026, 11).await.unwrap();
    let invoice = repo.find_all().await.unwrap().remove(0);
    let id = invoice.id.clone().unwrap().to_string();
    let holder = invoice.collector.clone().unwrap().to_string();
    let target = if holder == c1 { c2 } else { c1 };

    let updated = repo
        .update(
            &id,
            InvoiceUpdate {
                collector: Some(target.parse().unwrap()),
                due_date: Some(invoice.due_date + 86_400_000),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.due_date, invoice.due_date + 86_400_000);
    assert!(repo.find_by_collector(&holder).await.unwrap().is_empty());
    assert_eq!(repo.find_by_collector(&target).await.unwrap().len(), 1);

    // Only active collectors can take an invoice
    let err = repo
        .update(
            &id,
            InvoiceUpdate {
                collector: Some("user:nobody".parse().unwrap()),
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn reassignment_moves_unpaid_invoices() {
    let db = test_db().await;
    let role = seed_role(&db, "Collector").await;
    let c1 = seed_user(&db, "old@test.com", &role).await;
    let c2 = seed_user(&db, "new@test.com", &role).await;
    let customers = seed_customers(&db, 100.0, 1).await;
    let customer_id = customers[0].id.clone().unwrap().to_string();

    let invoices = InvoiceRepository::new(db.clone());
    invoices.generate_monthly(2026, 9).await.unwrap();
    // Single customer lands on the first collector
    assert_eq!(invoices.find_by_collector(&c1).await.unwrap().len(), 1);

    let collectors = CollectorRepository::new(db.clone());
    let moved = collectors
        .set_assignments(&c2, std::slice::from_ref(&customer_id))
        .await
        .unwrap();
    assert_eq!(moved, 1);
    assert!(invoices.find_by_collector(&c1).await.unwrap().is_empty());
    assert_eq!(invoices.find_by_collector(&c2).await.unwrap().len(), 1);

    let overview = collectors.assignments(&c2).await.unwrap();
    assert_eq!(overview.all_customers.len(), 1);
    assert_eq!(overview.assigned_customers.len(), 1);
    assert!(overview.unassigned_customers.is_empty());

    // Clearing the list detaches every unpaid invoice
    collectors.set_assignments(&c2, &[]).await.unwrap();
    assert!(invoices.find_by_collector(&c2).await.unwrap().is_empty());
    let overview = collectors.assignments(&c2).await.unwrap();
    assert!(overview.assigned_customers.is_empty());
    assert_eq!(overview.unassigned_customers.len(), 1);
}
