use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. Created at registration and never
/// modified afterwards.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    // Argon2id PHC string. Never rendered or logged.
    pub password_hash: String,
}

/// Post
///
/// A blog post joined with its author's username, as every page that shows a
/// post also shows who wrote it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    // UTC, as written by SQLite's CURRENT_TIMESTAMP.
    pub created: NaiveDateTime,
    // FK to users.id.
    pub author_id: i64,
    pub username: String,
}

impl Post {
    /// The ownership rule: only the author may edit or delete a post.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

// --- Request Payloads (Input Schemas) ---

/// PostForm
///
/// Form body for `POST /create` and `POST /{id}/update`.
/// Missing fields count as empty, so a missing title fails validation like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl PostForm {
    /// Returns the message to show the user when the form cannot be saved.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.is_empty() {
            return Err("Title is required");
        }
        Ok(())
    }
}

/// CredentialsForm
///
/// Form body for both `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.is_empty() {
            return Err("Username is required.");
        }
        if self.password.is_empty() {
            return Err("Password is required.");
        }
        Ok(())
    }
}
