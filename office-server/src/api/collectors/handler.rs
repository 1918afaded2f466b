//! Collector API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CollectorTransaction, TransactionType};
use crate::db::repository::CollectorRepository;
use crate::db::repository::collector::{AssignmentOverview, CollectorOverview, TransactionFilter};
use crate::ledger::Currency;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// GET /api/collectors - 收款员及其双币余额
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<CollectorOverview>>> {
    let repo = CollectorRepository::new(state.db.clone());
    let overview = repo.list().await?;
    Ok(Json(overview))
}

/// GET /api/collectors/:id/assignments - 该收款员的客户分配情况
pub async fn assignments(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AssignmentOverview>> {
    let repo = CollectorRepository::new(state.db.clone());
    let overview = repo.assignments(&id).await?;
    Ok(Json(overview))
}

#[derive(Debug, Deserialize)]
pub struct SetAssignmentsRequest {
    /// `customer:<id>` entries; unpaid invoices of these customers get the
    /// collector, everything else is cleared
    pub assigned_customer_ids: Vec<String>,
}

/// PUT /api/collectors/:id/assignments - 批量改派
///
/// 两次批量更新在同一事务里执行。
pub async fn set_assignments(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<SetAssignmentsRequest>,
) -> AppResult<Json<usize>> {
    let repo = CollectorRepository::new(state.db.clone());
    let assigned = repo
        .set_assignments(&id, &payload.assigned_customer_ids)
        .await?;
    Ok(Json(assigned))
}

#[derive(Debug, Deserialize)]
pub struct CashMovementRequest {
    pub amount: f64,
    pub currency: Currency,
    pub description: Option<String>,
}

/// POST /api/collectors/:id/receive - 从收款员收取现金
pub async fn receive(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CashMovementRequest>,
) -> AppResult<Json<CollectorTransaction>> {
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;
    let admin = current_user
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid user id in token"))?;

    let repo = CollectorRepository::new(state.db.clone());
    let tx = repo
        .receive(
            &id,
            payload.amount,
            payload.currency,
            state.config.usd_lbp_rate,
            payload.description,
            &admin,
        )
        .await?;
    Ok(Json(tx))
}

/// POST /api/collectors/:id/pay - 向收款员支付现金
pub async fn pay(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CashMovementRequest>,
) -> AppResult<Json<CollectorTransaction>> {
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;
    let admin = current_user
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid user id in token"))?;

    let repo = CollectorRepository::new(state.db.clone());
    let tx = repo
        .pay(
            &id,
            payload.amount,
            payload.currency,
            state.config.usd_lbp_rate,
            payload.description,
            &admin,
        )
        .await?;
    Ok(Json(tx))
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// `received` | `paid`
    #[serde(rename = "type")]
    pub tx_type: Option<TransactionType>,
    /// `YYYY-MM-DD`, inclusive
    pub start: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub end: Option<String>,
}

/// GET /api/collectors/:id/transactions - 流水查询，最多 100 条
pub async fn transactions(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<Vec<CollectorTransaction>>> {
    let from = query
        .start
        .as_deref()
        .map(|d| parse_date(d).map(day_start_millis))
        .transpose()?;
    let to = query
        .end
        .as_deref()
        .map(|d| parse_date(d).map(day_end_millis))
        .transpose()?;

    if let (Some(from), Some(to)) = (from, to)
        && from >= to
    {
        return Err(AppError::validation("Date range is empty"));
    }

    let repo = CollectorRepository::new(state.db.clone());
    let transactions = repo
        .transactions(
            &id,
            TransactionFilter {
                tx_type: query.tx_type,
                from,
                to,
            },
        )
        .await?;
    Ok(Json(transactions))
}
