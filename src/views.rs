//! Page view-models.
//!
//! Every page has one struct holding exactly what it shows, and a `render()` that turns
//! it into HTML. All user-supplied text goes through [`escape`].

use axum::http::StatusCode;

use crate::{auth::SessionUser, models::Post};

/// Escapes text for use in HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared page chrome: title, navigation, an optional error banner, then the content.
fn layout(
    user: Option<&SessionUser>,
    title: &str,
    header: &str,
    error: Option<&str>,
    content: &str,
) -> String {
    let mut html = format!(
        "<!doctype html>\n<title>{} - Blog</title>\n<nav>\n  <h1><a href=\"/\">Blog</a></h1>\n  <ul>\n",
        escape(title)
    );
    match user {
        Some(user) => html.push_str(&format!(
            "    <li><span>{}</span>\n    <li><a href=\"/auth/logout\">Log Out</a>\n",
            escape(&user.username)
        )),
        None => {
            html.push_str("    <li><a href=\"/auth/register\">Register</a>\n");
            html.push_str("    <li><a href=\"/auth/login\">Log In</a>\n");
        }
    }
    html.push_str("  </ul>\n</nav>\n<section class=\"content\">\n");
    html.push_str(&format!("  <header>{header}</header>\n"));
    if let Some(error) = error {
        html.push_str(&format!("  <div class=\"flash\">{}</div>\n", escape(error)));
    }
    html.push_str(content);
    html.push_str("</section>\n");
    html
}

// --- Index ---

/// One row of the post listing.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub post: Post,
    // Drives the Edit link; true only for the post's author.
    pub can_edit: bool,
}

/// IndexView
///
/// `GET /`: every post, newest first.
#[derive(Debug, Clone)]
pub struct IndexView {
    pub user: Option<SessionUser>,
    pub posts: Vec<PostEntry>,
}

impl IndexView {
    /// Annotates each post with whether `user` may edit it.
    pub fn new(user: Option<SessionUser>, posts: Vec<Post>) -> Self {
        let posts = posts
            .into_iter()
            .map(|post| PostEntry {
                can_edit: user.as_ref().is_some_and(|u| post.is_owned_by(u.id)),
                post,
            })
            .collect();
        Self { user, posts }
    }

    pub fn render(&self) -> String {
        let mut header = String::from("<h1>Posts</h1>");
        if self.user.is_some() {
            header.push_str("<a class=\"action\" href=\"/create\">New</a>");
        }

        let mut content = String::new();
        for (i, PostEntry { post, can_edit }) in self.posts.iter().enumerate() {
            if i > 0 {
                content.push_str("  <hr>\n");
            }
            content.push_str(&format!(
                "  <article class=\"post\">\n    <header>\n      <div>\n        <h1>{}</h1>\n        <div class=\"about\">by {} on {}</div>\n      </div>\n",
                escape(&post.title),
                escape(&post.username),
                post.created.format("%Y-%m-%d"),
            ));
            if *can_edit {
                content.push_str(&format!(
                    "      <a class=\"action\" href=\"/{}/update\">Edit</a>\n",
                    post.id
                ));
            }
            content.push_str(&format!(
                "    </header>\n    <p class=\"body\">{}</p>\n  </article>\n",
                escape(&post.body)
            ));
        }

        layout(self.user.as_ref(), "Posts", &header, None, &content)
    }
}

// --- Create / Update ---

/// Which post form is being shown. An update names the post by its stored title,
/// whatever the form currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PostFormMode {
    Create,
    Update { id: i64, stored_title: String },
}

/// PostFormView
///
/// `GET|POST /create` and `GET|POST /{id}/update`. The update form also offers the
/// delete button, which is only ever shown to the author.
#[derive(Debug, Clone)]
pub struct PostFormView {
    pub user: SessionUser,
    pub mode: PostFormMode,
    pub title: String,
    pub body: String,
    pub error: Option<String>,
}

impl PostFormView {
    pub fn render(&self) -> String {
        let heading = match &self.mode {
            PostFormMode::Create => "New Post".to_string(),
            PostFormMode::Update { stored_title, .. } => format!("Edit \"{stored_title}\""),
        };
        let header = format!("<h1>{}</h1>", escape(&heading));

        let mut content = format!(
            "  <form method=\"post\">\n    <label for=\"title\">Title</label>\n    <input name=\"title\" id=\"title\" value=\"{}\" required>\n    <label for=\"body\">Body</label>\n    <textarea name=\"body\" id=\"body\">{}</textarea>\n    <input type=\"submit\" value=\"Save\">\n  </form>\n",
            escape(&self.title),
            escape(&self.body),
        );
        if let PostFormMode::Update { id, .. } = &self.mode {
            content.push_str(&format!(
                "  <hr>\n  <form action=\"/{id}/delete\" method=\"post\">\n    <input class=\"danger\" type=\"submit\" value=\"Delete\" onclick=\"return confirm('Are you sure?');\">\n  </form>\n"
            ));
        }

        layout(
            Some(&self.user),
            &heading,
            &header,
            self.error.as_deref(),
            &content,
        )
    }
}

// --- Register / Log In ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthFormKind {
    Register,
    Login,
}

impl AuthFormKind {
    fn title(self) -> &'static str {
        match self {
            AuthFormKind::Register => "Register",
            AuthFormKind::Login => "Log In",
        }
    }
}

/// AuthFormView
///
/// `GET|POST /auth/register` and `GET|POST /auth/login`.
#[derive(Debug, Clone)]
pub struct AuthFormView {
    pub user: Option<SessionUser>,
    pub kind: AuthFormKind,
    // Echoed back after a failed attempt; the password never is.
    pub username: String,
    pub error: Option<String>,
}

impl AuthFormView {
    pub fn render(&self) -> String {
        let title = self.kind.title();
        let header = format!("<h1>{title}</h1>");
        let content = format!(
            "  <form method=\"post\">\n    <label for=\"username\">Username</label>\n    <input name=\"username\" id=\"username\" value=\"{}\" required>\n    <label for=\"password\">Password</label>\n    <input type=\"password\" name=\"password\" id=\"password\" required>\n    <input type=\"submit\" value=\"{title}\">\n  </form>\n",
            escape(&self.username),
        );
        layout(
            self.user.as_ref(),
            title,
            &header,
            self.error.as_deref(),
            &content,
        )
    }
}

// --- Errors ---

/// ErrorView
///
/// Body of 403/404/500 responses.
#[derive(Debug, Clone)]
pub struct ErrorView {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorView {
    pub fn render(&self) -> String {
        let reason = self.status.canonical_reason().unwrap_or("Error");
        format!(
            "<!doctype html>\n<title>{code} {reason}</title>\n<h1>{reason}</h1>\n<p>{}</p>\n",
            escape(&self.message),
            code = self.status.as_u16(),
        )
    }
}
