//! Task API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Task, TaskCreate, TaskUpdate};
use crate::db::repository::TaskRepository;
use crate::utils::validation::{
    MAX_COMMENT_LEN, MAX_DESCRIPTION_LEN, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/tasks
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Task>>> {
    let repo = TaskRepository::new(state.db.clone());
    let tasks = repo.find_all().await?;
    Ok(Json(tasks))
}

/// GET /api/tasks/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Task {} not found", id)))?;
    Ok(Json(task))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TaskCreate>,
) -> AppResult<Json<Task>> {
    validate_required_text(&payload.description, "Description", MAX_DESCRIPTION_LEN)?;

    let repo = TaskRepository::new(state.db.clone());
    let task = repo.create(payload).await?;
    Ok(Json(task))
}

/// PUT /api/tasks/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TaskUpdate>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo.update(&id, payload).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// `user:<id>` of the technician
    pub technician: String,
}

/// PUT /api/tasks/:id/assign - 指派 (接受前可改派)
pub async fn assign(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo.assign(&id, &payload.technician).await?;
    Ok(Json(task))
}

/// PUT /api/tasks/:id/cancel - 取消任意未完结工单
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo.cancel(&id).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub message: String,
}

/// POST /api/tasks/:id/comment - 后台评论
pub async fn add_comment(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<Json<Task>> {
    validate_required_text(&payload.message, "Message", MAX_COMMENT_LEN)?;

    let repo = TaskRepository::new(state.db.clone());
    let task = repo
        .add_comment(&id, &current_user.id, &current_user.name, &payload.message)
        .await?;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id - 删除工单 (进行中的需先取消)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = TaskRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    Ok(Json(deleted))
}
