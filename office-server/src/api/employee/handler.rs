//! Employee API Handlers
//!
//! 手机端由技术员和收款员使用，所有资金与阶段规则复用后台的
//! repository 校验，这里只补充"本人"约束。

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use shared::client::{ChangePasswordRequest, LoginRequest, LoginResponse, UserInfo};
use shared::message::TaskCommentPayload;

use crate::api::auth::handler::{build_user_info, login_user};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Invoice, Task, TaskStage};
use crate::db::repository::{InvoiceRepository, TaskRepository, UserRepository};
use crate::utils::time::now_ms;
use crate::utils::validation::{MAX_COMMENT_LEN, validate_password, validate_required_text};
use crate::utils::{AppError, AppResult};

/// POST /api/employee/login - 外勤端登录
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = login_user(&state, &payload).await?;
    Ok(Json(response))
}

/// GET /api/employee/profile
pub async fn profile(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(build_user_info(&state.db, &user).await?))
}

/// POST /api/employee/change-password
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<bool>> {
    validate_password(&payload.new_password)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let verified = user
        .verify_password(&payload.old_password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !verified {
        return Err(AppError::validation("Old password is incorrect"));
    }

    repo.set_password(&current_user.id, &payload.new_password)
        .await?;
    Ok(Json(true))
}

#[derive(Debug, Deserialize)]
pub struct TaskSearchQuery {
    pub search: Option<String>,
}

/// GET /api/employee/tasks?search= - 本人的工单，可按编号或客户名搜索
pub async fn list_tasks(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<TaskSearchQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let repo = TaskRepository::new(state.db.clone());
    let tasks = repo
        .find_for_assignee(&current_user.id, query.search.as_deref())
        .await?;
    Ok(Json(tasks))
}

/// GET /api/employee/tasks/ongoing - 本人进行中的工单
pub async fn ongoing_tasks(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Task>>> {
    let repo = TaskRepository::new(state.db.clone());
    let tasks = repo.find_ongoing_for(&current_user.id).await?;
    Ok(Json(tasks))
}

/// POST /api/employee/tasks/:id/accept - 接单 (同一时间只能有一个活动工单)
pub async fn accept_task(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo.accept(&id, &current_user.id).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    /// `arrived` | `completed`
    pub stage: String,
}

/// POST /api/employee/tasks/:id/update-stage - 阶段推进
pub async fn update_stage(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStageRequest>,
) -> AppResult<Json<Task>> {
    // 非法阶段名走 400，与其它校验错误一致
    let stage: TaskStage = payload
        .stage
        .parse()
        .map_err(|e: String| AppError::validation(e))?;

    let repo = TaskRepository::new(state.db.clone());
    let task = repo.advance(&id, &current_user.id, stage).await?;
    Ok(Json(task))
}

/// POST /api/employee/tasks/:id/cancel - 放弃工单
pub async fn cancel_task(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let repo = TaskRepository::new(state.db.clone());
    let task = repo.cancel_by_assignee(&id, &current_user.id).await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub message: String,
}

/// POST /api/employee/tasks/:id/comment - 现场评论，推送到后台
pub async fn comment_task(
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

    state
        .events
        .broadcast_task_comment(&TaskCommentPayload {
            task_id: id,
            user_id: current_user.id.clone(),
            message: payload.message,
            created_at: now_ms(),
        })
        .await;

    Ok(Json(task))
}

/// GET /api/employee/invoices - 本人手上的未结账单
pub async fn list_invoices(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Invoice>>> {
    let repo = InvoiceRepository::new(state.db.clone());
    let invoices = repo.find_open_by_collector(&current_user.id).await?;
    Ok(Json(invoices))
}

#[derive(Debug, Deserialize)]
pub struct PayInvoiceRequest {
    /// LBP
    pub amount: f64,
}

/// POST /api/employee/invoices/:id/pay - 上门收款
pub async fn pay_invoice(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<PayInvoiceRequest>,
) -> AppResult<Json<Invoice>> {
    // 只能收自己名下的账单
    let repo = InvoiceRepository::new(state.db.clone());
    let invoice = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Invoice {} not found", id)))?;
    let mine = invoice
        .collector
        .as_ref()
        .map(|c| c.to_string() == current_user.id)
        .unwrap_or(false);
    if !mine {
        return Err(AppError::not_found("Invoice not found or not assigned to you"));
    }

    let invoice = repo.make_payment(&id, payload.amount).await?;
    Ok(Json(invoice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn unknown_stage_name_is_a_bad_request() {
        let err = "sideways"
            .parse::<TaskStage>()
            .map_err(|e: String| AppError::validation(e))
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn stage_request_body_accepts_any_string() {
        let req: UpdateStageRequest = serde_json::from_str(r#"{"stage":"arrived"}"#).unwrap();
        assert_eq!(req.stage.parse::<TaskStage>().unwrap(), TaskStage::Arrived);

        // 未知阶段也能反序列化，由 handler 转成校验错误
        let req: UpdateStageRequest = serde_json::from_str(r#"{"stage":"sideways"}"#).unwrap();
        assert!(req.stage.parse::<TaskStage>().is_err());
    }
}
