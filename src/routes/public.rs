use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. Handlers here still look at the session
/// (via `CurrentUser`) to decide what navigation to show.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; does not touch the database.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // All posts, newest first. Edit links appear only on the viewer's own posts.
        .route("/", get(handlers::index))
        // GET|POST /auth/register
        .route(
            "/auth/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET|POST /auth/login
        // A successful POST sets the signed `session` cookie.
        .route("/auth/login", get(handlers::login_form).post(handlers::login))
        // GET /auth/logout
        .route("/auth/logout", get(handlers::logout))
}
