//! Company API Handlers

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Company;
use crate::db::repository::CompanyRepository;
use crate::db::repository::company::{CashoutRangeReport, CashoutReport};
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

/// 历史查询默认条数
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// GET /api/company - 现金台账 (首次访问时初始化)
pub async fn get_ledger(State(state): State<ServerState>) -> AppResult<Json<Company>> {
    let repo = CompanyRepository::new(state.db.clone());
    let company = repo.get_or_init().await?;
    Ok(Json(company))
}

#[derive(Debug, Deserialize)]
pub struct CashoutRequest {
    /// LBP
    pub amount: f64,
    pub reason: String,
}

/// POST /api/company/cashout - 提现
pub async fn cashout(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CashoutRequest>,
) -> AppResult<Json<Company>> {
    validate_required_text(&payload.reason, "Reason", MAX_NOTE_LEN)?;

    let performed_by = current_user
        .id
        .parse()
        .map_err(|_| AppError::internal("Invalid user id in token"))?;

    let repo = CompanyRepository::new(state.db.clone());
    let company = repo
        .cashout(
            payload.amount,
            &payload.reason,
            performed_by,
            &current_user.name,
        )
        .await?;
    Ok(Json(company))
}

#[derive(Debug, Deserialize)]
pub struct CashoutHistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/company/cashout-history?limit=50 - 提现历史，新到旧，带累计
pub async fn cashout_history(
    State(state): State<ServerState>,
    Query(query): Query<CashoutHistoryQuery>,
) -> AppResult<Json<CashoutReport>> {
    let repo = CompanyRepository::new(state.db.clone());
    let report = repo
        .cashout_report(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct CashoutByDateQuery {
    /// `YYYY-MM-DD`
    pub start: String,
    /// `YYYY-MM-DD`, inclusive
    pub end: String,
}

/// GET /api/company/cashout-by-date?start=..&end=.. - 区间报表
pub async fn cashout_by_date(
    State(state): State<ServerState>,
    Query(query): Query<CashoutByDateQuery>,
) -> AppResult<Json<CashoutRangeReport>> {
    let start = day_start_millis(parse_date(&query.start)?);
    let end = day_end_millis(parse_date(&query.end)?);
    if end <= start {
        return Err(AppError::validation("End date must not precede start date"));
    }

    let repo = CompanyRepository::new(state.db.clone());
    let report = repo.cashouts_in_range(start, end).await?;
    Ok(Json(report))
}
