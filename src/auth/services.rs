use axum::extract::FromRef;
use tracing::{error, info, instrument};

use super::{
    jwt::JwtKeys,
    password::{credential_key, generate_salt, hash_password, verify_password},
    repo::KeyType,
};
use crate::{
    error::{absorb, BlogError, BlogResult},
    state::AppState,
    users::{repo_types::UserDocument, services::normalize_email},
};

/// Registers a user. False when the input is empty or malformed, the
/// username is taken, or any store fails.
#[instrument(skip(st, password))]
pub async fn create_user(
    st: &AppState,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> bool {
    absorb("create_user", register(st, username, password, email).await).is_some()
}

async fn register(
    st: &AppState,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> BlogResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(BlogError::validation("username and password are required"));
    }
    let email = normalize_email(email)?;

    let key = credential_key(username);
    let existing = st
        .round_trip("credentials.key_type", st.credentials.key_type(&key))
        .await?;
    if existing != KeyType::Missing {
        return Err(BlogError::validation(format!("user {username} already exists")));
    }

    let taken = st
        .round_trip("users.find_by_username", st.users.find_by_username(username))
        .await?;
    if taken.is_some() {
        return Err(BlogError::validation(format!("user {username} already exists")));
    }

    let salt = generate_salt();
    let hash = hash_password(&key, &salt, password);
    let created = st
        .round_trip(
            "credentials.create_fields",
            st.credentials
                .create_fields(&key, &[("salt", salt.as_str()), ("hash", hash.as_str())]),
        )
        .await?;
    if !created {
        // A concurrent registration got the key first; it is not ours to undo.
        return Err(BlogError::validation(format!("user {username} already exists")));
    }

    // Not atomic with the credential write above: a crash here leaves
    // credentials without a user document.
    let doc = UserDocument {
        username: username.to_string(),
        email,
    };
    if let Err(e) = st.round_trip("users.insert", st.users.insert(&doc)).await {
        if let Err(undo) = st
            .round_trip("credentials.delete", st.credentials.delete(&key))
            .await
        {
            error!(%username, error = %undo, "credential compensation failed");
        }
        return Err(e);
    }

    info!(%username, "user registered");
    Ok(())
}

/// Returns a signed session token when the password matches. Unknown users
/// and wrong passwords both yield `None`.
#[instrument(skip(st, password))]
pub async fn authenticate_user(st: &AppState, username: &str, password: &str) -> Option<String> {
    absorb("authenticate_user", login(st, username, password).await)
}

async fn login(st: &AppState, username: &str, password: &str) -> BlogResult<String> {
    if username.is_empty() || password.is_empty() {
        return Err(BlogError::validation("username and password are required"));
    }

    let key = credential_key(username);
    let kind = st
        .round_trip("credentials.key_type", st.credentials.key_type(&key))
        .await?;
    if kind != KeyType::Hash {
        return Err(BlogError::validation("invalid credentials"));
    }

    let stored = st
        .round_trip("credentials.get_field", st.credentials.get_field(&key, "hash"))
        .await?;
    let salt = st
        .round_trip("credentials.get_field", st.credentials.get_field(&key, "salt"))
        .await?;
    let (Some(stored), Some(salt)) = (stored, salt) else {
        return Err(BlogError::validation("invalid credentials"));
    };

    if !verify_password(&key, &salt, password, &stored) {
        return Err(BlogError::validation("invalid credentials"));
    }

    let token = JwtKeys::from_ref(st).sign(username)?;
    info!(%username, "user logged in");
    Ok(token)
}
