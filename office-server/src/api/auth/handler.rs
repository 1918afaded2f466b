//! Auth API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::client::{LoginRequest, LoginResponse, SignupRequest, UserInfo};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{RoleCreate, User, UserCreate};
use crate::db::repository::{RoleRepository, UserRepository};
use crate::security_log;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_PERSON_NAME_LEN, validate_email, validate_password, validate_phone,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Resolve the role name and flatten a user record into the wire shape
pub(crate) async fn build_user_info(db: &Surreal<Db>, user: &User) -> AppResult<UserInfo> {
    let roles = RoleRepository::new(db.clone());
    let role_name = roles
        .find_by_id(&user.role.to_string())
        .await?
        .map(|r| r.name)
        .unwrap_or_default();

    Ok(UserInfo {
        id: user
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        phone_number: user.phone_number.clone(),
        address: user.address.clone(),
        role: user.role.to_string(),
        role_name,
        is_active: user.is_active,
        last_login: user.last_login,
    })
}

/// Verify credentials and issue a token. Shared with the mobile login.
pub(crate) async fn login_user(
    state: &ServerState,
    payload: &LoginRequest,
) -> AppResult<LoginResponse> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !user.is_active {
        security_log!("WARN", "login_inactive", email = payload.email.clone());
        return Err(AppError::invalid_credentials());
    }

    let verified = user
        .verify_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !verified {
        security_log!("WARN", "login_failed", email = payload.email.clone());
        return Err(AppError::invalid_credentials());
    }

    let info = build_user_info(&state.db, &user).await?;
    let token = state
        .jwt_service
        .generate_token(&info.id, &user.email, &user.display_name(), &info.role_name)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    repo.touch_last_login(&info.id).await?;

    Ok(LoginResponse { token, user: info })
}

/// POST /api/auth/login - 管理端登录
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = login_user(&state, &payload).await?;
    Ok(Json(response))
}

/// POST /api/auth/signup - 首个管理员注册
///
/// 只在系统没有任何用户时开放，之后的账号由管理员创建。
pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.clone());
    if !repo.find_all().await?.is_empty() {
        return Err(AppError::forbidden("Signup is closed"));
    }

    validate_required_text(&payload.first_name, "First name", MAX_PERSON_NAME_LEN)?;
    validate_required_text(&payload.last_name, "Last name", MAX_PERSON_NAME_LEN)?;
    validate_required_text(&payload.address, "Address", MAX_ADDRESS_LEN)?;
    validate_email(&payload.email)?;
    validate_phone(&payload.phone_number, "Phone number")?;
    validate_password(&payload.password)?;

    let roles = RoleRepository::new(state.db.clone());
    let admin_role = match roles.find_by_name("Admin").await? {
        Some(role) => role,
        None => {
            roles
                .create(RoleCreate {
                    name: "Admin".to_string(),
                    description: Some("Full access".to_string()),
                })
                .await?
        }
    };

    let role_id = admin_role
        .id
        .ok_or_else(|| AppError::internal("Admin role has no id"))?;

    repo.create(UserCreate {
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        email: payload.email.clone(),
        phone_number: payload.phone_number.clone(),
        address: payload.address.clone(),
        password: payload.password.clone(),
        role: role_id,
    })
    .await?;

    security_log!("INFO", "signup_bootstrap", email = payload.email.clone());

    let response = login_user(
        &state,
        &LoginRequest {
            email: payload.email,
            password: payload.password,
        },
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/auth/me - 当前登录用户
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let info = build_user_info(&state.db, &user).await?;
    Ok(Json(info))
}
