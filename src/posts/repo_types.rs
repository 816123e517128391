use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Post record as stored. A comment is a post with `response_to` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub response_to: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A post with its materialized comment tree. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAndComments {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub children: Vec<PostAndComments>,
}

impl PostAndComments {
    pub fn new(post: Post, children: Vec<PostAndComments>) -> Self {
        Self {
            id: post.id,
            author: post.author,
            text: post.text,
            created_at: post.created_at,
            children,
        }
    }

    pub fn leaf(post: Post) -> Self {
        Self::new(post, Vec::new())
    }

    /// Number of posts below this node.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}
