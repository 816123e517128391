use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the document store. Credentials live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserDocument {
    pub username: String,      // unique key
    pub email: Option<String>, // notification address
}
