//! User API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use shared::client::UserInfo;

use crate::api::auth::handler::build_user_info;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_PERSON_NAME_LEN, validate_email, validate_password, validate_phone,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/users - 获取所有用户 (含停用)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<UserInfo>>> {
    let repo = UserRepository::new(state.db.clone());
    let users = repo.find_all().await?;

    let mut infos = Vec::with_capacity(users.len());
    for user in &users {
        infos.push(build_user_info(&state.db, user).await?);
    }
    Ok(Json(infos))
}

/// GET /api/users/:id - 获取单个用户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;
    Ok(Json(build_user_info(&state.db, &user).await?))
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<UserInfo>> {
    validate_required_text(&payload.first_name, "First name", MAX_PERSON_NAME_LEN)?;
    validate_required_text(&payload.last_name, "Last name", MAX_PERSON_NAME_LEN)?;
    validate_required_text(&payload.address, "Address", MAX_ADDRESS_LEN)?;
    validate_email(&payload.email)?;
    validate_phone(&payload.phone_number, "Phone number")?;
    validate_password(&payload.password)?;

    let repo = UserRepository::new(state.db.clone());
    let user: User = repo.create(payload).await?;
    Ok(Json(build_user_info(&state.db, &user).await?))
}

/// PUT /api/users/:id - 更新用户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<UserInfo>> {
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref phone) = payload.phone_number {
        validate_phone(phone, "Phone number")?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(&id, payload).await?;
    Ok(Json(build_user_info(&state.db, &user).await?))
}

/// DELETE /api/users/:id - 停用账号 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    // 禁止停用自己，防止最后一个管理员被锁在门外
    if current_user.id == id {
        return Err(AppError::conflict("Cannot deactivate your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    let result = repo.deactivate(&id).await?;
    Ok(Json(result))
}
