//! Task API 模块
//!
//! 工单的后台管理：创建、指派、取消、评论，仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get, routing::post, routing::put};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tasks", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_role(&[])));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/assign", put(handler::assign))
        .route("/{id}/cancel", put(handler::cancel))
        .route("/{id}/comment", post(handler::add_comment))
        .layer(middleware::from_fn(require_role(&[])));

    read_routes.merge(manage_routes)
}
