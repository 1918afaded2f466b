//! Service API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Service, ServiceCreate, ServiceUpdate};
use crate::db::repository::ServiceRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/services
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Service>>> {
    let repo = ServiceRepository::new(state.db.clone());
    let services = repo.find_all().await?;
    Ok(Json(services))
}

/// GET /api/services/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Service>> {
    let repo = ServiceRepository::new(state.db.clone());
    let service = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Service {} not found", id)))?;
    Ok(Json(service))
}

/// POST /api/services
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ServiceCreate>,
) -> AppResult<Json<Service>> {
    validate_required_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = ServiceRepository::new(state.db.clone());
    let service = repo.create(payload).await?;
    Ok(Json(service))
}

/// PUT /api/services/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ServiceUpdate>,
) -> AppResult<Json<Service>> {
    validate_optional_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = ServiceRepository::new(state.db.clone());
    let service = repo.update(&id, payload).await?;
    Ok(Json(service))
}

/// DELETE /api/services/:id - 仅无订阅客户时可删
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = ServiceRepository::new(state.db.clone());
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
