use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    repo_types::{Post, PostAndComments},
    tree,
};
use crate::{
    access::{authorize, require_role, Role},
    context::Context,
    error::{absorb, BlogError, BlogResult},
    notify::{dispatch_in_background, reply_notification},
    state::AppState,
};

/// Creates a root post, or a reply when `response_to` is set. Replying
/// notifies the parent's author in the background.
#[instrument(skip(st, text))]
pub async fn create_post(
    st: &AppState,
    ctx: &Context,
    text: &str,
    response_to: Option<Uuid>,
) -> Option<PostAndComments> {
    absorb("create_post", insert_post(st, ctx, text, response_to).await)
}

async fn insert_post(
    st: &AppState,
    ctx: &Context,
    text: &str,
    response_to: Option<Uuid>,
) -> BlogResult<PostAndComments> {
    let author = ctx.logged_in_as().ok_or(BlogError::Authorization {
        required: Role::User,
        actual: Role::Guest,
    })?;
    if text.is_empty() {
        return Err(BlogError::validation("post text is required"));
    }

    // Any user may reply; owning the parent changes nothing here.
    let (_, parent) = authorize(st, ctx, Role::User, response_to).await?;
    if let (Some(parent_id), None) = (response_to, &parent) {
        return Err(BlogError::not_found(format!("parent post {parent_id}")));
    }

    let post = Post {
        id: Uuid::new_v4(),
        author: author.to_string(),
        text: text.to_string(),
        response_to,
        created_at: OffsetDateTime::now_utc(),
    };
    st.round_trip("posts.insert", st.posts.insert(&post)).await?;
    info!(post_id = %post.id, %author, reply = parent.is_some(), "post created");

    if let Some(parent) = parent {
        let (subject, body) = reply_notification(&parent.author, author, text);
        dispatch_in_background(
            st.notifier.clone(),
            st.config.storage_timeout(),
            parent.author,
            subject,
            body,
        );
    }

    Ok(PostAndComments::leaf(post))
}

/// Replaces the text of a post (and bumps its timestamp). Owner only.
/// Returns the post with its comment tree.
#[instrument(skip(st, text))]
pub async fn edit_post(
    st: &AppState,
    ctx: &Context,
    post_id: Uuid,
    text: &str,
) -> Option<PostAndComments> {
    absorb("edit_post", rewrite_post(st, ctx, post_id, text).await)
}

async fn rewrite_post(
    st: &AppState,
    ctx: &Context,
    post_id: Uuid,
    text: &str,
) -> BlogResult<PostAndComments> {
    require_role(st, ctx, Role::Owner, Some(post_id)).await?;
    if text.is_empty() {
        return Err(BlogError::validation("post text is required"));
    }

    st.round_trip(
        "posts.update_text",
        st.posts.update_text(post_id, text, OffsetDateTime::now_utc()),
    )
    .await?
    .ok_or_else(|| BlogError::not_found(format!("post {post_id}")))?;

    let flat = tree::get_post(st, post_id).await?;
    tree::unflatten(flat)?
        .into_iter()
        .next()
        .ok_or_else(|| BlogError::not_found(format!("post {post_id}")))
}

/// Root posts of `author` with their comment trees, newest first.
#[instrument(skip(st))]
pub async fn get_posts(st: &AppState, author: &str) -> Option<Vec<PostAndComments>> {
    absorb("get_posts", tree::get_posts(st, author).await)
}

/// Every post `author` wrote, comments included, as flat records.
#[instrument(skip(st))]
pub async fn get_all_posts(st: &AppState, author: &str) -> Option<Vec<Post>> {
    let posts = st
        .round_trip("posts.find_by_author", st.posts.find_by_author(author))
        .await;
    absorb("get_all_posts", posts)
}
