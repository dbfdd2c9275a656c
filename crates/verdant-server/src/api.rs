//! HTTP surface: application state, router assembly and the serve loop.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use chrono::Utc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use verdant_shared::protocol::HealthResponse;

use crate::auth;
use crate::config::ServerConfig;
use crate::db::Db;
use crate::guard;
use crate::orders;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Db>>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    // Routes behind the identity guard. `GET /api/orders` authenticates
    // inline because its path is shared with the public POST.
    let protected = Router::new()
        .route("/api/auth/verify-token", post(auth::verify_token))
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/orders/:order_id/status", put(orders::update_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_identity,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route("/api/orders/:order_id", get(orders::get_order))
        .merge(protected)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        message: format!("Verdant API v{}", env!("CARGO_PKG_VERSION")),
        timestamp: Utc::now(),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
