//! Company API 模块
//!
//! 公司现金台账：余额、提现和提现历史。全部仅 Admin。

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/company", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_ledger))
        .route("/cashout", post(handler::cashout))
        .route("/cashout-history", get(handler::cashout_history))
        .route("/cashout-by-date", get(handler::cashout_by_date))
        .layer(middleware::from_fn(require_role(&[])))
}
