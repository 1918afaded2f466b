//! Employee (mobile) API 模块
//!
//! 外勤端接口：技术员的工单流转、收款员的账单收款。
//! login 是公共路由，其余按角色分组。

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/employee", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new().route("/login", post(handler::login));

    let account_routes = Router::new()
        .route("/profile", get(handler::profile))
        .route("/change-password", post(handler::change_password));

    let technician_routes = Router::new()
        .route("/tasks", get(handler::list_tasks))
        .route("/tasks/ongoing", get(handler::ongoing_tasks))
        .route("/tasks/{id}/accept", post(handler::accept_task))
        .route("/tasks/{id}/update-stage", post(handler::update_stage))
        .route("/tasks/{id}/cancel", post(handler::cancel_task))
        .route("/tasks/{id}/comment", post(handler::comment_task))
        .layer(middleware::from_fn(require_role(&["Technician"])));

    let collector_routes = Router::new()
        .route("/invoices", get(handler::list_invoices))
        .route("/invoices/{id}/pay", post(handler::pay_invoice))
        .layer(middleware::from_fn(require_role(&["Collector"])));

    public_routes
        .merge(account_routes)
        .merge(technician_routes)
        .merge(collector_routes)
}
