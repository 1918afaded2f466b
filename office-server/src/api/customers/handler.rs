//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Customer, CustomerCreate, CustomerUpdate, Invoice};
use crate::db::repository::{CustomerRepository, InvoiceRepository};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_phone,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/customers
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Customer>>> {
    let repo = CustomerRepository::new(state.db.clone());
    let customers = repo.find_all().await?;
    Ok(Json(customers))
}

/// GET /api/customers/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;
    Ok(Json(customer))
}

/// GET /api/customers/:id/invoices - 客户账单历史
pub async fn list_invoices(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Invoice>>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_by_customer(&id).await?;
    Ok(Json(invoices))
}

/// POST /api/customers
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<Json<Customer>> {
    validate_required_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_required_text(&payload.location, "Location", MAX_ADDRESS_LEN)?;
    validate_phone(&payload.phone_number, "Phone number")?;
    validate_optional_text(&payload.notes, "Notes", MAX_NOTE_LEN)?;

    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo.create(payload).await?;
    Ok(Json(customer))
}

/// PUT /api/customers/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    if let Some(ref phone) = payload.phone_number {
        validate_phone(phone, "Phone number")?;
    }
    validate_optional_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.location, "Location", MAX_ADDRESS_LEN)?;
    validate_optional_text(&payload.notes, "Notes", MAX_NOTE_LEN)?;

    let repo = CustomerRepository::new(state.db.clone());
    let customer = repo.update(&id, payload).await?;
    Ok(Json(customer))
}

/// DELETE /api/customers/:id - 停用 (软删除，保留账单历史)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = CustomerRepository::new(state.db.clone());
    let result = repo.deactivate(&id).await?;
    Ok(Json(result))
}
