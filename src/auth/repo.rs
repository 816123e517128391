use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;

/// What a key currently holds in the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Missing,
    Hash,
    Other,
}

/// Fast key-value store holding `salt` and `hash` fields under
/// `user:<username>`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType>;
    /// Creates the hash with all fields in one step, unless `key` already
    /// exists. Returns whether this call created it.
    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> anyhow::Result<bool>;
    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

// EXISTS and HSET run as one script, so two writers cannot both create.
const CREATE_HASH_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
"#;

#[derive(Clone)]
pub struct RedisCredentialStore {
    conn: ConnectionManager,
}

impl RedisCredentialStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("parse redis url")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType> {
        let mut conn = self.conn.clone();
        let kind: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        Ok(match kind.as_str() {
            "none" => KeyType::Missing,
            "hash" => KeyType::Hash,
            _ => KeyType::Other,
        })
    }

    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> anyhow::Result<bool> {
        anyhow::ensure!(!fields.is_empty(), "no fields to set for {key}");
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(CREATE_HASH_SCRIPT).arg(1).arg(key);
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }
        let created: i64 = cmd.query_async(&mut conn).await?;
        Ok(created == 1)
    }

    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
