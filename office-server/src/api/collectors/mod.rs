//! Collector API 模块
//!
//! 收款员台账：余额总览、客户分配、收付款和流水查询。全部仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/collectors", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route(
            "/{id}/assignments",
            get(handler::assignments).put(handler::set_assignments),
        )
        .route("/{id}/receive", post(handler::receive))
        .route("/{id}/pay", post(handler::pay))
        .route("/{id}/transactions", get(handler::transactions))
        .layer(middleware::from_fn(require_role(&[])))
}
