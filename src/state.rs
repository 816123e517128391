use std::{future::Future, sync::Arc};

use tracing::warn;

use crate::{
    auth::repo::{CredentialStore, RedisCredentialStore},
    config::AppConfig,
    db,
    error::BlogResult,
    notify::{EmailDispatcher, NotificationDispatcher},
    posts::repo::{PgPostStore, PostStore},
    storage::{
        self,
        memory::{MemoryCredentialStore, MemoryPostStore, MemoryUserStore},
    },
    users::repo::{PgUserStore, UserStore},
};

/// Immutable per-process state, built once at startup and cloned into every
/// request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<dyn CredentialStore>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let credentials: Arc<dyn CredentialStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisCredentialStore::connect(url).await?),
            None => {
                warn!("REDIS_URL not set; credentials are kept in memory");
                Arc::new(MemoryCredentialStore::default())
            }
        };

        let (users, posts) = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
                let posts: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool));
                (users, posts)
            }
            None => {
                warn!("DATABASE_URL not set; users and posts are kept in memory");
                let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::default());
                let posts: Arc<dyn PostStore> = Arc::new(MemoryPostStore::default());
                (users, posts)
            }
        };

        let notifier = Arc::new(EmailDispatcher::new(users.clone(), config.mail_enabled));

        Ok(Self::from_parts(config, credentials, users, posts, notifier))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        credentials: Arc<dyn CredentialStore>,
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            config,
            credentials,
            users,
            posts,
            notifier,
        }
    }

    /// One storage call, bounded by the configured timeout.
    pub async fn round_trip<T, F>(&self, what: &'static str, fut: F) -> BlogResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        storage::deadline(self.config.storage_timeout(), what, fut).await
    }
}
