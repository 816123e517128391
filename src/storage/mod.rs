//! Shared plumbing for the storage collaborators: the per-call deadline and
//! the in-memory backends used when no external store is configured.

pub mod memory;

use std::{future::Future, time::Duration};

use anyhow::Context as _;

use crate::error::{BlogError, BlogResult};

/// Runs one storage round trip under `limit`. An elapsed deadline is a
/// storage failure like any other.
pub async fn deadline<T, F>(limit: Duration, what: &'static str, fut: F) -> BlogResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.context(what).map_err(BlogError::from),
        Err(_) => Err(BlogError::Storage(anyhow::anyhow!(
            "{what} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
