use tracing::{debug, instrument};
use uuid::Uuid;

use super::Role;
use crate::{
    context::Context,
    error::{BlogError, BlogResult},
    posts::repo_types::Post,
    state::AppState,
};

/// Resolves the caller's role, optionally against the ownership of a post.
/// A post id that does not resolve to a post yields `User`, not an error.
#[instrument(skip(st))]
pub async fn get_role(st: &AppState, ctx: &Context, post_id: Option<Uuid>) -> BlogResult<Role> {
    Ok(resolve(st, ctx, post_id).await?.0)
}

/// Fails with [`BlogError::Authorization`] unless the resolved role is at
/// least `required`. Returns the resolved role.
pub async fn require_role(
    st: &AppState,
    ctx: &Context,
    required: Role,
    post_id: Option<Uuid>,
) -> BlogResult<Role> {
    Ok(authorize(st, ctx, required, post_id).await?.0)
}

/// [`require_role`], also handing back the post the role was resolved
/// against so callers need not fetch it again.
pub(crate) async fn authorize(
    st: &AppState,
    ctx: &Context,
    required: Role,
    post_id: Option<Uuid>,
) -> BlogResult<(Role, Option<Post>)> {
    let (actual, post) = resolve(st, ctx, post_id).await?;
    if actual.satisfies(required) {
        Ok((actual, post))
    } else {
        Err(BlogError::Authorization { required, actual })
    }
}

async fn resolve(
    st: &AppState,
    ctx: &Context,
    post_id: Option<Uuid>,
) -> BlogResult<(Role, Option<Post>)> {
    let Some(caller) = ctx.logged_in_as() else {
        return Ok((Role::Guest, None));
    };
    let Some(post_id) = post_id else {
        return Ok((Role::User, None));
    };

    let post = st
        .round_trip("posts.find_by_id", st.posts.find_by_id(post_id))
        .await?;
    let role = match &post {
        Some(p) if p.author == caller => Role::Owner,
        _ => Role::User,
    };
    debug!(%caller, %post_id, %role, "role resolved");
    Ok((role, post))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guest_fails_user_and_owner() {
        let (st, stores) = AppState::fake();
        let post = stores.seed_post("alice", "Hello", None).await;
        let guest = Context::guest();

        assert_eq!(get_role(&st, &guest, Some(post.id)).await.unwrap(), Role::Guest);
        assert!(require_role(&st, &guest, Role::Guest, None).await.is_ok());
        assert!(matches!(
            require_role(&st, &guest, Role::User, None).await,
            Err(BlogError::Authorization {
                required: Role::User,
                actual: Role::Guest
            })
        ));
        assert!(require_role(&st, &guest, Role::Owner, Some(post.id))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn author_is_owner_others_are_users() {
        let (st, stores) = AppState::fake();
        let post = stores.seed_post("alice", "Hello", None).await;
        let alice = Context::user("alice");
        let bob = Context::user("bob");

        assert_eq!(require_role(&st, &alice, Role::Owner, Some(post.id)).await.unwrap(), Role::Owner);
        assert!(matches!(
            require_role(&st, &bob, Role::Owner, Some(post.id)).await,
            Err(BlogError::Authorization {
                required: Role::Owner,
                actual: Role::User
            })
        ));
        assert!(require_role(&st, &bob, Role::User, Some(post.id)).await.is_ok());
        assert!(require_role(&st, &alice, Role::User, None).await.is_ok());
    }

    #[tokio::test]
    async fn missing_post_resolves_to_user() {
        let (st, _stores) = AppState::fake();
        let alice = Context::user("alice");
        assert_eq!(get_role(&st, &alice, Some(Uuid::new_v4())).await.unwrap(), Role::User);
        assert!(require_role(&st, &alice, Role::Owner, Some(Uuid::new_v4()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn authorize_hands_back_the_resolved_post() {
        let (st, stores) = AppState::fake();
        let post = stores.seed_post("alice", "Hello", None).await;

        let (role, found) = authorize(&st, &Context::user("bob"), Role::User, Some(post.id))
            .await
            .unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(found, Some(post));

        let (_, missing) = authorize(&st, &Context::user("bob"), Role::User, Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }
}
