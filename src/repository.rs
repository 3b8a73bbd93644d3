use crate::{
    error::{AppError, Result},
    models::{Post, User},
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers talk to this trait only,
/// so tests can swap in an in-memory mock without a database.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // Fails with `AppError::UsernameTaken` when the name is already in use.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    // --- Posts ---
    // Newest first.
    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    async fn create_post(&self, title: &str, body: &str, author_id: i64) -> Result<Post>;
    // Returns false when no row matched.
    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<bool>;
    async fn delete_post(&self, id: i64) -> Result<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Every post query selects the same columns, joined with the author's name.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.body, p.created, p.author_id, u.username
    FROM posts p JOIN users u ON p.author_id = u.id
"#;

/// SqliteRepository
///
/// The concrete implementation of `Repository`, backed by a SQLite pool.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username, password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Relies on the UNIQUE constraint on `users.username` rather than a prior lookup,
    /// so two concurrent registrations of the same name cannot both succeed.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES (?, ?) RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::UsernameTaken(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// list_posts
    ///
    /// Ties on `created` (same second) fall back to the id, so the newest insert
    /// still comes first.
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let sql = format!("{POST_SELECT} ORDER BY p.created DESC, p.id DESC");
        let posts = sqlx::query_as::<_, Post>(&sql).fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("{POST_SELECT} WHERE p.id = ?");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(&self, title: &str, body: &str, author_id: i64) -> Result<Post> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, body, author_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(body)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        // Re-read through the join so the caller gets the author's name and timestamp.
        self.get_post(id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_post(&self, id: i64, title: &str, body: &str) -> Result<bool> {
        let res = sqlx::query("UPDATE posts SET title = ?, body = ? WHERE id = ?")
            .bind(title)
            .bind(body)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
