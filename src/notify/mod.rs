//! Best-effort notifications. Nothing here may fail the operation that
//! triggered it.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::users::repo::UserStore;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, to_username: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Resolves the recipient's email from the users collection and hands the
/// message to the outbox log. Users without an email are skipped.
pub struct EmailDispatcher {
    users: Arc<dyn UserStore>,
    enabled: bool,
}

impl EmailDispatcher {
    pub fn new(users: Arc<dyn UserStore>, enabled: bool) -> Self {
        Self { users, enabled }
    }
}

#[async_trait]
impl NotificationDispatcher for EmailDispatcher {
    async fn send(&self, to_username: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let user = self
            .users
            .find_by_username(to_username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no user document for {to_username}"))?;

        match user.email.filter(|e| !e.is_empty()) {
            Some(email) if self.enabled => {
                info!(target: "blogd::outbox", to = %email, %subject, %body, "notification queued");
            }
            Some(_) => debug!(%to_username, "mailing disabled, notification dropped"),
            None => debug!(%to_username, "no email on file, notification dropped"),
        }
        Ok(())
    }
}

/// Subject and body of the message sent to `parent_author` when `replier`
/// answers one of their posts.
pub fn reply_notification(parent_author: &str, replier: &str, text: &str) -> (String, String) {
    let body = format!(
        "Dear {parent_author},\n\n{replier} replied to your post!\n{replier} wrote:\n\"{text}\"\n\nThanks!"
    );
    ("New Reply!".to_string(), body)
}

/// Sends in a detached task. Failures and timeouts are logged and dropped,
/// never retried.
pub fn dispatch_in_background(
    dispatcher: Arc<dyn NotificationDispatcher>,
    limit: Duration,
    to_username: String,
    subject: String,
    body: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::time::timeout(limit, dispatcher.send(&to_username, &subject, &body)).await {
            Ok(Ok(())) => debug!(%to_username, "notification dispatched"),
            Ok(Err(e)) => warn!(%to_username, error = %e, "notification failed"),
            Err(_) => warn!(%to_username, "notification timed out"),
        }
    })
}

#[cfg(test)]
pub use recording::RecordingDispatcher;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        storage::memory::MemoryUserStore,
        users::repo_types::UserDocument,
    };

    async fn users_with(docs: &[(&str, Option<&str>)]) -> Arc<dyn UserStore> {
        let store = MemoryUserStore::default();
        for (username, email) in docs {
            store
                .insert(&UserDocument {
                    username: username.to_string(),
                    email: email.map(str::to_string),
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn reply_message_names_both_users() {
        let (subject, body) = reply_notification("alice", "bob", "Hi");
        assert_eq!(subject, "New Reply!");
        assert!(body.starts_with("Dear alice,"));
        assert!(body.contains("bob replied to your post!"));
        assert!(body.contains("\"Hi\""));
    }

    #[tokio::test]
    async fn unknown_recipient_is_an_error() {
        let dispatcher = EmailDispatcher::new(users_with(&[]).await, true);
        assert!(dispatcher.send("ghost", "s", "b").await.is_err());
    }

    #[tokio::test]
    async fn recipients_without_email_are_skipped() {
        let users = users_with(&[("alice", None), ("bob", Some("bob@example.com"))]).await;
        let dispatcher = EmailDispatcher::new(users, false);
        assert!(dispatcher.send("alice", "s", "b").await.is_ok());
        assert!(dispatcher.send("bob", "s", "b").await.is_ok());
    }

    #[tokio::test]
    async fn background_failure_is_swallowed() {
        let recorder = Arc::new(RecordingDispatcher::default());
        recorder.fail_sends(true).await;
        let handle = dispatch_in_background(
            recorder.clone(),
            Duration::from_secs(1),
            "alice".into(),
            "s".into(),
            "b".into(),
        );
        assert!(handle.await.is_ok());
        assert_eq!(recorder.sent().await.len(), 1);
    }
}
