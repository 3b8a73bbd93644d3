use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::views::ErrorView;

/// Where anonymous users are sent when they hit a protected page.
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("You are not the author of this post.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("User {0} is already registered.")]
    UsernameTaken(String),

    #[error(transparent)]
    Form(#[from] FormRejection),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl AppError {
    pub fn post_not_found(id: i64) -> Self {
        AppError::NotFound(format!("Post id {id} doesn't exist."))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthenticated => return Redirect::to(LOGIN_PATH).into_response(),
            AppError::Form(rejection) => {
                tracing::debug!("Rejected form body: {}", rejection.body_text());
                return rejection.into_response();
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UsernameTaken(_) => StatusCode::CONFLICT,
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Session(ref e) => {
                tracing::error!("Session token error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::PasswordHash(ref e) => {
                tracing::error!("Password hashing error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal failures get a generic message; the detail only goes to the log.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Html(ErrorView { status, message }.render())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
