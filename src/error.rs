use thiserror::Error;
use tracing::{error, warn};

use crate::access::Role;

pub type BlogResult<T> = Result<T, BlogError>;

/// Failure kinds inside the core. None of these cross the public boundary:
/// every public operation collapses them with [`absorb`].
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("role required: {required}, actual role: {actual}")]
    Authorization { required: Role, actual: Role },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl BlogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Logs the failure and turns it into `None`.
pub fn absorb<T>(operation: &'static str, result: BlogResult<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e @ BlogError::Storage(_)) => {
            error!(operation, error = %e, "operation failed");
            None
        }
        Err(e) => {
            warn!(operation, error = %e, "operation rejected");
            None
        }
    }
}
