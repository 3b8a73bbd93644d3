use blog_portal::{
    AppConfig, AppState, create_router, db,
    repository::{RepositoryState, SqliteRepository},
};
use reqwest::{Client, StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestServer {
    pub address: String,
    pub client: Client,
}

/// Serves the real router on an ephemeral port over an empty in-memory database.
async fn spawn_server() -> TestServer {
    let config = AppConfig::default();
    let pool = db::connect(&config.db_url)
        .await
        .expect("Failed to open in-memory database");
    db::init_db(&pool).await.expect("Failed to run migrations");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;
    let router = create_router(AppState { repo, config });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are part of what is under test, so never follow them.
    let client = Client::builder().redirect(Policy::none()).build().unwrap();
    TestServer {
        address: format!("http://127.0.0.1:{port}"),
        client,
    }
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url(path))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.to_string());
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        request.send().await.expect("request failed")
    }
}

fn location(response: &reqwest::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_health_check_and_request_id() {
    let server = spawn_server().await;

    let response = server.client.get(server.url("/health")).send().await.unwrap();
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");

    // A client-supplied id is echoed back unchanged.
    let response = server
        .client
        .get(server.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_openapi_document_lists_blog_paths() {
    let server = spawn_server().await;

    let body = server
        .client
        .get(server.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let paths = doc["paths"].as_object().unwrap();
    for path in ["/", "/create", "/{id}/update", "/{id}/delete", "/auth/login"] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}

#[tokio::test]
async fn test_post_lifecycle() {
    let server = spawn_server().await;

    // Register, then log in.
    let response = server
        .post_form("/auth/register", "username=alice&password=pw", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = server
        .post_form("/auth/login", "username=alice&password=pw", None)
        .await;
    assert_eq!(location(&response), "/");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // Create.
    let response = server
        .post_form("/create", "title=first&body=hello+world", Some(&cookie))
        .await;
    assert_eq!(location(&response), "/");

    let index = server
        .client
        .get(server.url("/"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(index.contains("first"));
    assert!(index.contains("hello world"));
    assert!(index.contains("href=\"/1/update\""));

    // Update.
    let response = server
        .post_form("/1/update", "title=second&body=", Some(&cookie))
        .await;
    assert_eq!(location(&response), "/");

    // Delete, then it is gone.
    let response = server.post_form("/1/delete", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    let response = server.post_form("/1/delete", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Anonymous visitors are bounced to the login page.
    let response = server.post_form("/create", "title=x", None).await;
    assert_eq!(location(&response), "/auth/login");
}
