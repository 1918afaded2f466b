//! User API 模块
//!
//! 员工账号管理。列表对 Manager 开放，其余仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    let list_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_role(&["Manager"])));

    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_role(&[])));

    list_routes.merge(manage_routes)
}
