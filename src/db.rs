use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Pool for the document store. Expects the `users` and `posts` tables to
/// exist already.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}
