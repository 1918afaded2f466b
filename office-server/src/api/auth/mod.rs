//! Auth API 模块
//!
//! 登录、注册和当前用户信息。login/signup 是公共路由
//! (见 [`crate::auth::middleware::require_auth`])。

pub(crate) mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/signup", post(handler::signup))
        .route("/me", get(handler::me))
}
