use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here creates or changes a post. The router is wrapped in the
/// authentication layer in `create_router`, so anonymous requests are redirected to
/// `/auth/login` before any handler runs. Ownership (author-only) checks for update
/// and delete happen inside the handlers, after the post is loaded.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET|POST /create
        .route(
            "/create",
            get(handlers::create_form).post(handlers::create_post),
        )
        // GET|POST /{id}/update
        // 404 if the post is missing, 403 if the session user is not its author.
        .route(
            "/{id}/update",
            get(handlers::update_form).post(handlers::update_post),
        )
        // POST /{id}/delete
        .route("/{id}/delete", post(handlers::delete_post))
}
