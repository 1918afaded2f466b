//! Role API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Role, RoleCreate, RoleUpdate};
use crate::db::repository::RoleRepository;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

/// GET /api/roles - 获取所有角色
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Role>>> {
    let repo = RoleRepository::new(state.db.clone());
    let roles = repo.find_all().await?;
    Ok(Json(roles))
}

/// GET /api/roles/:id - 获取单个角色
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Role>> {
    let repo = RoleRepository::new(state.db.clone());
    let role = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {} not found", id)))?;
    Ok(Json(role))
}

/// POST /api/roles - 创建角色
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    validate_required_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = RoleRepository::new(state.db.clone());
    let role = repo.create(payload).await?;
    Ok(Json(role))
}

/// PUT /api/roles/:id - 更新角色
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    validate_optional_text(&payload.name, "Name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "Description", MAX_NOTE_LEN)?;

    let repo = RoleRepository::new(state.db.clone());
    let role = repo.update(&id, payload).await?;
    Ok(Json(role))
}

/// DELETE /api/roles/:id - 删除角色 (仅未被引用时)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = RoleRepository::new(state.db.clone());
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}
