//! Customer API 模块
//!
//! 订阅用户管理，仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customers", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/invoices", get(handler::list_invoices))
        .layer(middleware::from_fn(require_role(&[])));

    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_role(&[])));

    read_routes.merge(manage_routes)
}
