//! Invoice API 模块
//!
//! 账单的创建、月度批量生成、折扣和收款，仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get, routing::post, routing::put};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/invoices", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/status/{status}", get(handler::list_by_status))
        .route("/collector/{id}", get(handler::list_by_collector))
        .route("/overdue/list", get(handler::list_overdue))
        .layer(middleware::from_fn(require_role(&[])));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/generate-monthly", post(handler::generate_monthly))
        .route("/{id}/apply-discount", post(handler::apply_discount))
        .route("/{id}/remove-discount", post(handler::remove_discount))
        .route("/{id}/payment", post(handler::make_payment))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_role(&[])));

    read_routes.merge(manage_routes)
}
