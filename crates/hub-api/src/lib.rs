pub mod auth;
pub mod error;
pub mod feed;
pub mod middleware;
pub mod ownership;
pub mod password;
pub mod rate_limit;
pub mod replies;
pub mod session;
pub mod token;
pub mod validation;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::auth::AppState;
use crate::middleware::require_auth;
use crate::rate_limit::limit_sessions;

/// All API routes, mounted under `/api`. CORS and tracing layers are the
/// binary's concern. Session routes are rate limited per client; serve with
/// `into_make_service_with_connect_info::<SocketAddr>()` so clients are told
/// apart.
pub fn router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/api/session/check", post(auth::check_email))
        .route("/api/session/signup", post(auth::signup))
        .route("/api/session/login", post(auth::login))
        .route("/api/session/me", get(auth::me))
        .route("/api/session/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), limit_sessions));

    let public_routes = Router::new()
        .route("/api/reply/{id}", get(replies::list_replies))
        .route("/api/health", get(health));

    let protected_routes = Router::new()
        .route("/api/feed", get(feed::list_messages).post(feed::create_message))
        .route("/api/feed/{id}", delete(feed::delete_message))
        .route("/api/reply", post(replies::create_reply))
        .route("/api/reply/{id}", delete(replies::delete_reply))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(session_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// GET /health: liveness check (no auth).
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
