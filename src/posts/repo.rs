use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Post;

/// Document-store view of the `posts` collection.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: &Post) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Direct replies, oldest first, ties by author.
    async fn find_children(&self, parent: Uuid) -> anyhow::Result<Vec<Post>>;
    /// Root posts of `author`, newest first, ties by author.
    async fn find_roots_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>>;
    /// Every post of `author`, newest first, ties by author.
    async fn find_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>>;
    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Post>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: &Post) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author, text, response_to, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(post.id)
        .bind(&post.author)
        .bind(&post.text)
        .bind(post.response_to)
        .bind(post.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, text, response_to, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }

    async fn find_children(&self, parent: Uuid) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, text, response_to, created_at
            FROM posts
            WHERE response_to = $1
            ORDER BY created_at ASC, author ASC
            "#,
        )
        .bind(parent)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_roots_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, text, response_to, created_at
            FROM posts
            WHERE author = $1 AND response_to IS NULL
            ORDER BY created_at DESC, author ASC
            "#,
        )
        .bind(author)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author, text, response_to, created_at
            FROM posts
            WHERE author = $1
            ORDER BY created_at DESC, author ASC
            "#,
        )
        .bind(author)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $2, created_at = $3
            WHERE id = $1
            RETURNING id, author, text, response_to, created_at
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(at)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            DELETE FROM posts
            WHERE id = $1
            RETURNING id, author, text, response_to, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }
}
