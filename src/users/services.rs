use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument};

use super::dto::{Blog, SettingsUpdate, UserSettings};
use crate::{
    access::{require_role, Role},
    context::Context,
    error::{absorb, BlogError, BlogResult},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims the address; an empty address means "no email".
pub(crate) fn normalize_email(email: Option<&str>) -> BlogResult<Option<String>> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !is_valid_email(email) {
        return Err(BlogError::validation(format!("invalid email {email:?}")));
    }
    Ok(Some(email.to_string()))
}

#[instrument(skip(st))]
pub async fn get_user_settings(st: &AppState, ctx: &Context) -> Option<UserSettings> {
    absorb("get_user_settings", load_settings(st, ctx).await)
}

async fn load_settings(st: &AppState, ctx: &Context) -> BlogResult<UserSettings> {
    require_role(st, ctx, Role::User, None).await?;
    let username = caller(ctx)?;
    let user = st
        .round_trip("users.find_by_username", st.users.find_by_username(username))
        .await?
        .ok_or_else(|| BlogError::not_found(format!("user {username}")))?;
    Ok(UserSettings { email: user.email })
}

#[instrument(skip(st))]
pub async fn update_user_settings(st: &AppState, ctx: &Context, settings: &SettingsUpdate) -> bool {
    absorb("update_user_settings", apply_settings(st, ctx, settings).await).is_some()
}

async fn apply_settings(st: &AppState, ctx: &Context, settings: &SettingsUpdate) -> BlogResult<()> {
    require_role(st, ctx, Role::User, None).await?;
    let username = caller(ctx)?;

    let matched = match settings.email.as_deref() {
        Some(email) => {
            let email = normalize_email(Some(email))?;
            st.round_trip(
                "users.update_email",
                st.users.update_email(username, email.as_deref()),
            )
            .await?
        }
        None => st
            .round_trip("users.find_by_username", st.users.find_by_username(username))
            .await?
            .is_some(),
    };
    if !matched {
        return Err(BlogError::not_found(format!("user {username}")));
    }
    info!(%username, "settings updated");
    Ok(())
}

/// Every registered user, as a blog directory.
#[instrument(skip(st))]
pub async fn get_all_blogs(st: &AppState) -> Option<Vec<Blog>> {
    let names = st
        .round_trip("users.list_usernames", st.users.list_usernames())
        .await;
    absorb("get_all_blogs", names)
        .map(|names| names.into_iter().map(|name| Blog { name }).collect())
}

fn caller(ctx: &Context) -> BlogResult<&str> {
    ctx.logged_in_as().ok_or(BlogError::Authorization {
        required: Role::User,
        actual: Role::Guest,
    })
}
