//! Server Implementation
//!
//! HTTP 服务器启动和管理

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::{Config, Result, ServerError, ServerState};
use crate::events::EventsService;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        // Core APIs
        .merge(crate::api::auth::router())
        .merge(crate::api::health::router())
        .merge(crate::api::roles::router())
        .merge(crate::api::users::router())
        // Catalog APIs
        .merge(crate::api::services::router())
        .merge(crate::api::zones::router())
        .merge(crate::api::categories::router())
        .merge(crate::api::customers::router())
        // Billing and dispatch APIs
        .merge(crate::api::invoices::router())
        .merge(crate::api::tasks::router())
        // Ledger APIs
        .merge(crate::api::collectors::router())
        .merge(crate::api::company::router())
        // Mobile (field staff) APIs
        .merge(crate::api::employee::router())
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests inject an in-memory db)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let (socket_layer, events) = EventsService::new_layer();

        // The socket layer and the events handle are created together, so a
        // pre-built state gets its events service swapped for the live one.
        let state = match &self.state {
            Some(s) => {
                let mut s = s.clone();
                s.events = events;
                s
            }
            None => ServerState::initialize(&self.config, events).await,
        };

        let app = build_app()
            // JWT 认证中间件 - require_auth 内部会跳过公共路由
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
            .layer(socket_layer)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(log_request));

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("🏢 Office server starting on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Io)?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(ServerError::Io)?;

        Ok(())
    }
}
