use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::repo::{CredentialStore, KeyType},
    posts::{repo::PostStore, repo_types::Post},
    users::{repo::UserStore, repo_types::UserDocument},
};

#[derive(Default)]
pub struct MemoryCredentialStore {
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryCredentialStore {
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.hashes.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType> {
        let kind = if self.hashes.read().await.contains_key(key) {
            KeyType::Hash
        } else {
            KeyType::Missing
        };
        Ok(kind)
    }

    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> anyhow::Result<bool> {
        anyhow::ensure!(!fields.is_empty(), "no fields to set for {key}");
        let mut hashes = self.hashes.write().await;
        if hashes.contains_key(key) {
            return Ok(false);
        }
        let entry = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();
        hashes.insert(key.to_string(), entry);
        Ok(true)
    }

    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .hashes
            .read()
            .await
            .get(key)
            .and_then(|h| h.get(field).cloned()))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.hashes.write().await.remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<String, UserDocument>>,
    reject_inserts: RwLock<bool>,
}

impl MemoryUserStore {
    #[cfg(test)]
    pub async fn reject_inserts(&self, reject: bool) {
        *self.reject_inserts.write().await = reject;
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &UserDocument) -> anyhow::Result<()> {
        anyhow::ensure!(!*self.reject_inserts.read().await, "users collection unavailable");
        let mut users = self.users.write().await;
        anyhow::ensure!(
            !users.contains_key(&user.username),
            "duplicate username {}",
            user.username
        );
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserDocument>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn update_email(&self, username: &str, email: Option<&str>) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(username) else {
            return Ok(false);
        };
        user.email = email.map(str::to_string);
        Ok(true)
    }

    async fn list_usernames(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.users.read().await.keys().cloned().collect())
    }
}

/// Posts kept in insertion order; queries sort the same way the SQL does.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
    failing_deletes: RwLock<HashSet<Uuid>>,
    failing_child_reads: RwLock<HashSet<Uuid>>,
}

impl MemoryPostStore {
    #[cfg(test)]
    pub async fn fail_delete_of(&self, id: Uuid) {
        self.failing_deletes.write().await.insert(id);
    }

    /// Makes `find_children(parent)` fail from now on.
    #[cfg(test)]
    pub async fn fail_children_of(&self, parent: Uuid) {
        self.failing_child_reads.write().await.insert(parent);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    async fn select(&self, keep: impl Fn(&Post) -> bool, newest_first: bool) -> Vec<Post> {
        let mut rows: Vec<Post> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| keep(*p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let by_time = if newest_first {
                b.created_at.cmp(&a.created_at)
            } else {
                a.created_at.cmp(&b.created_at)
            };
            by_time.then_with(|| a.author.cmp(&b.author))
        });
        rows
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, post: &Post) -> anyhow::Result<()> {
        let mut posts = self.posts.write().await;
        anyhow::ensure!(posts.iter().all(|p| p.id != post.id), "duplicate post id {}", post.id);
        posts.push(post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_children(&self, parent: Uuid) -> anyhow::Result<Vec<Post>> {
        anyhow::ensure!(
            !self.failing_child_reads.read().await.contains(&parent),
            "reading replies to post {parent} failed"
        );
        Ok(self.select(|p| p.response_to == Some(parent), false).await)
    }

    async fn find_roots_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>> {
        Ok(self
            .select(|p| p.author == author && p.response_to.is_none(), true)
            .await)
    }

    async fn find_by_author(&self, author: &str) -> anyhow::Result<Vec<Post>> {
        Ok(self.select(|p| p.author == author, true).await)
    }

    async fn update_text(
        &self,
        id: Uuid,
        text: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.text = text.to_string();
        post.created_at = at;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        anyhow::ensure!(
            !self.failing_deletes.read().await.contains(&id),
            "delete of post {id} failed"
        );
        let mut posts = self.posts.write().await;
        let idx = posts.iter().position(|p| p.id == id);
        Ok(idx.map(|idx| posts.remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn post(author: &str, parent: Option<Uuid>, minute: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            author: author.into(),
            text: format!("{author} at {minute}"),
            response_to: parent,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn children_sort_oldest_first_then_author() {
        let store = MemoryPostStore::default();
        let root = post("alice", None, 0);
        store.insert(&root).await.unwrap();
        for p in [
            post("carol", Some(root.id), 2),
            post("bob", Some(root.id), 2),
            post("dave", Some(root.id), 1),
        ] {
            store.insert(&p).await.unwrap();
        }

        let authors: Vec<_> = store
            .find_children(root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.author)
            .collect();
        assert_eq!(authors, ["dave", "bob", "carol"]);
    }

    #[tokio::test]
    async fn roots_sort_newest_first_and_skip_comments() {
        let store = MemoryPostStore::default();
        let old = post("alice", None, 0);
        let new = post("alice", None, 5);
        let reply = post("alice", Some(old.id), 9);
        for p in [&old, &new, &reply] {
            store.insert(p).await.unwrap();
        }

        let roots = store.find_roots_by_author("alice").await.unwrap();
        assert_eq!(roots.iter().map(|p| p.id).collect::<Vec<_>>(), [new.id, old.id]);
        let all = store.find_by_author("alice").await.unwrap();
        assert_eq!(all.first().map(|p| p.id), Some(reply.id));
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryUserStore::default();
        let doc = UserDocument {
            username: "alice".into(),
            email: None,
        };
        store.insert(&doc).await.unwrap();
        assert!(store.insert(&doc).await.is_err());
    }
}
