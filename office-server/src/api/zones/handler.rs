//! Zone API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Zone, ZoneCreate, ZoneUpdate};
use crate::db::repository::ZoneRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/zones - 获取所有区域
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Zone>>> {
    let repo = ZoneRepository::new(state.db.clone());
    let zones = repo.find_all().await?;
    Ok(Json(zones))
}

/// GET /api/zones/:id - 获取单个区域
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Zone>> {
    let repo = ZoneRepository::new(state.db.clone());
    let zone = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Zone {} not found", id)))?;
    Ok(Json(zone))
}

/// POST /api/zones - 创建区域
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ZoneCreate>,
) -> AppResult<Json<Zone>> {
    validate_required_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = ZoneRepository::new(state.db.clone());
    let zone = repo.create(payload).await?;
    Ok(Json(zone))
}

/// PUT /api/zones/:id - 更新区域
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ZoneUpdate>,
) -> AppResult<Json<Zone>> {
    validate_optional_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = ZoneRepository::new(state.db.clone());
    let zone = repo.update(&id, payload).await?;
    Ok(Json(zone))
}

/// DELETE /api/zones/:id - 仅无客户时可删
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = ZoneRepository::new(state.db.clone());
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
