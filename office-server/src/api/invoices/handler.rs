//! Invoice API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{Invoice, InvoiceCreate, InvoiceStatus, InvoiceUpdate};
use crate::db::repository::InvoiceRepository;
use crate::db::repository::invoice::MonthlyRunSummary;
use crate::utils::{AppError, AppResult};

/// GET /api/invoices - 全部账单，新到旧
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Invoice>>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_all().await?;
    Ok(Json(invoices))
}

/// GET /api/invoices/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", id)))?;
    Ok(Json(invoice))
}

/// GET /api/invoices/status/:status
pub async fn list_by_status(
    State(state): State<ServerState>,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<Invoice>>> {
    let status: InvoiceStatus = status
        .parse()
        .map_err(|e: String| AppError::validation(e))?;
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_by_status(status).await?;
    Ok(Json(invoices))
}

/// GET /api/invoices/collector/:id - 某收款员名下的全部账单
pub async fn list_by_collector(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Invoice>>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_by_collector(&id).await?;
    Ok(Json(invoices))
}

/// GET /api/invoices/overdue/list - 逾期未结账单
pub async fn list_overdue(State(state): State<ServerState>) -> AppResult<Json<Vec<Invoice>>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_overdue().await?;
    Ok(Json(invoices))
}

/// POST /api/invoices - 手工开单
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<InvoiceCreate>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.create(payload).await?;
    Ok(Json(invoice))
}

/// PUT /api/invoices/:id - 改派收款员或调整到期日
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<InvoiceUpdate>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.update(&id, payload).await?;
    Ok(Json(invoice))
}

#[derive(Debug, Deserialize)]
pub struct GenerateMonthlyRequest {
    pub year: i32,
    pub month: u32,
}

/// POST /api/invoices/generate-monthly - 月度批量开单
pub async fn generate_monthly(
    State(state): State<ServerState>,
    Json(payload): Json<GenerateMonthlyRequest>,
) -> AppResult<Json<MonthlyRunSummary>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let summary = repo.generate_monthly(payload.year, payload.month).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub discount: f64,
}

/// POST /api/invoices/:id/apply-discount
pub async fn apply_discount(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<DiscountRequest>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.apply_discount(&id, payload.discount).await?;
    Ok(Json(invoice))
}

/// POST /api/invoices/:id/remove-discount
pub async fn remove_discount(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.remove_discount(&id).await?;
    Ok(Json(invoice))
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// LBP
    pub amount: f64,
}

/// POST /api/invoices/:id/payment - 前台收款
pub async fn make_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PaymentRequest>,
) -> AppResult<Json<Invoice>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo.make_payment(&id, payload.amount).await?;
    Ok(Json(invoice))
}

/// DELETE /api/invoices/:id - 删除账单 (仅无收款记录时)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    Ok(Json(deleted))
}
