use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::UserDocument;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails if the username is taken.
    async fn insert(&self, user: &UserDocument) -> anyhow::Result<()>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserDocument>>;
    /// Returns false when no document matched.
    async fn update_email(&self, username: &str, email: Option<&str>) -> anyhow::Result<bool>;
    async fn list_usernames(&self) -> anyhow::Result<Vec<String>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &UserDocument) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserDocument>> {
        let user = sqlx::query_as::<_, UserDocument>(
            r#"
            SELECT username, email
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_email(&self, username: &str, email: Option<&str>) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE users SET email = $2 WHERE username = $1"#)
            .bind(username)
            .bind(email)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_usernames(&self) -> anyhow::Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(r#"SELECT username FROM users ORDER BY username"#)
            .fetch_all(&self.db)
            .await?;
        Ok(names)
    }
}
