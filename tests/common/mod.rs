#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use blog_portal::{
    AppConfig, AppState, create_router, db,
    password::hash_password,
    repository::{RepositoryState, SqliteRepository},
};
use sqlx::SqlitePool;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

/// Argon2 is deliberately slow, so each fixture password is hashed once per test binary.
fn fixture_hash(password: &'static str) -> String {
    static TEST: OnceLock<String> = OnceLock::new();
    static OTHER: OnceLock<String> = OnceLock::new();
    let cell = if password == "test" { &TEST } else { &OTHER };
    cell.get_or_init(|| hash_password(password).unwrap()).clone()
}

/// An app wired to a fresh in-memory database holding:
/// users `test`/`test` (id 1) and `other`/`other` (id 2), and post 1 by `test`.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

pub async fn spawn_app() -> TestApp {
    let config = AppConfig::default();
    let pool = db::connect(&config.db_url).await.unwrap();
    db::init_db(&pool).await.unwrap();

    sqlx::query("INSERT INTO users (username, password_hash) VALUES ('test', ?), ('other', ?)")
        .bind(fixture_hash("test"))
        .bind(fixture_hash("other"))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO posts (title, body, author_id, created) VALUES ('test title', 'test' || char(10) || 'body', 1, '2018-01-01 00:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let repo = Arc::new(SqliteRepository::new(pool.clone())) as RepositoryState;
    let router = create_router(AppState { repo, config });

    TestApp { router, pool }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// POSTs `form` (already url-encoded) as `application/x-www-form-urlencoded`.
    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    /// Logs in through `/auth/login` and returns the `Cookie` header value to send back.
    pub async fn login_as(&self, username: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/auth/login",
                &format!("username={username}&password={password}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login failed");
        session_cookie(&response).expect("login did not set a session cookie")
    }

    pub async fn login(&self) -> String {
        self.login_as("test", "test").await
    }

    pub async fn post_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(id) FROM posts")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post_body(&self, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT body FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post_title(&self, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT title FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }
}

/// The `name=value` part of the `session` Set-Cookie header, if one was sent.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
