use std::{collections::HashSet, sync::Mutex};

use futures::{future::try_join_all, future::BoxFuture, FutureExt};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    access::{require_role, Role},
    context::Context,
    error::{absorb, BlogError, BlogResult},
    state::AppState,
};

/// Deletes a post and every comment below it. Only the owner of `post_id`
/// may do this; that one check covers the descendants, whoever wrote them.
///
/// Not atomic: if any step fails the result is false, and whatever was
/// deleted before the failure stays deleted.
#[instrument(skip(st))]
pub async fn delete_post(st: &AppState, ctx: &Context, post_id: Uuid) -> bool {
    absorb("delete_post", delete_cascade(st, ctx, post_id).await).is_some()
}

/// Returns the number of deleted records.
pub(crate) async fn delete_cascade(
    st: &AppState,
    ctx: &Context,
    post_id: Uuid,
) -> BlogResult<usize> {
    require_role(st, ctx, Role::Owner, Some(post_id)).await?;
    let visited = Mutex::new(HashSet::new());
    let removed = delete_subtree(st, post_id, &visited).await?;
    info!(%post_id, removed, "post deleted with its comments");
    Ok(removed)
}

fn delete_subtree<'a>(
    st: &'a AppState,
    post_id: Uuid,
    visited: &'a Mutex<HashSet<Uuid>>,
) -> BoxFuture<'a, BlogResult<usize>> {
    async move {
        let first_visit = visited
            .lock()
            .map(|mut seen| seen.insert(post_id))
            .map_err(|_| BlogError::Storage(anyhow::anyhow!("visited set poisoned")))?;
        if !first_visit {
            return Err(BlogError::validation(format!("cycle through post {post_id}")));
        }

        st.round_trip("posts.delete", st.posts.delete(post_id))
            .await?
            .ok_or_else(|| BlogError::not_found(format!("post {post_id}")))?;

        let children = st
            .round_trip("posts.find_children", st.posts.find_children(post_id))
            .await?;
        let removed = try_join_all(
            children
                .iter()
                .map(|child| delete_subtree(st, child.id, visited)),
        )
        .await?;
        Ok(1 + removed.into_iter().sum::<usize>())
    }
    .boxed()
}
