use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// connect
///
/// Opens the SQLite pool described by `db_url`. Foreign keys are enforced so a post
/// can never reference a missing author.
///
/// An in-memory database lives only as long as its connection, so `sqlite::memory:`
/// gets a single, never-recycled connection.
pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = db_url.contains(":memory:");
    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// init_db
///
/// Applies the embedded migrations under `./migrations`. Safe to call on every start.
pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
