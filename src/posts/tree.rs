//! Comment-tree materialization from the flat `posts` collection.

use std::collections::HashMap;

use futures::{future::try_join_all, future::BoxFuture, FutureExt};
use uuid::Uuid;

use super::repo_types::{Post, PostAndComments};
use crate::{
    error::{BlogError, BlogResult},
    state::AppState,
};

/// Builds trees from a flat list in ancestor-first order (every post after
/// its parent). A post whose parent is not in the list becomes a root.
///
/// Input that breaks the ordering is rejected rather than guessed at: a
/// parent listed after its child, a post answering itself, or a repeated id
/// is a [`BlogError::Validation`].
pub fn unflatten(posts: Vec<Post>) -> BlogResult<Vec<PostAndComments>> {
    let mut position = HashMap::with_capacity(posts.len());
    for (i, post) in posts.iter().enumerate() {
        if position.insert(post.id, i).is_some() {
            return Err(BlogError::validation(format!("post {} listed twice", post.id)));
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); posts.len()];
    let mut roots = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        match post.response_to.and_then(|parent| position.get(&parent)) {
            None => roots.push(i),
            Some(&j) if j < i => children[j].push(i),
            Some(_) => {
                return Err(BlogError::validation(format!(
                    "post {} listed before its parent",
                    post.id
                )))
            }
        }
    }

    // Children always sit at higher indices, so a reverse sweep finishes
    // every subtree before its parent needs it.
    let mut built: Vec<Option<PostAndComments>> = vec![None; posts.len()];
    for (i, post) in posts.into_iter().enumerate().rev() {
        let kids = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        built[i] = Some(PostAndComments::new(post, kids));
    }

    Ok(roots.into_iter().filter_map(|r| built[r].take()).collect())
}

/// Every descendant of `post_id`: its direct replies first, then each
/// reply's own descendants in reply order. Sibling subtrees are fetched
/// concurrently.
pub fn get_comments(st: &AppState, post_id: Uuid) -> BoxFuture<'_, BlogResult<Vec<Post>>> {
    async move {
        let mut comments = st
            .round_trip("posts.find_children", st.posts.find_children(post_id))
            .await?;
        let nested = try_join_all(comments.iter().map(|c| get_comments(st, c.id))).await?;
        comments.extend(nested.into_iter().flatten());
        Ok(comments)
    }
    .boxed()
}

/// `[post] ++ get_comments(post)`, ready for [`unflatten`].
pub async fn get_post(st: &AppState, post_id: Uuid) -> BlogResult<Vec<Post>> {
    let post = st
        .round_trip("posts.find_by_id", st.posts.find_by_id(post_id))
        .await?
        .ok_or_else(|| BlogError::not_found(format!("post {post_id}")))?;
    let comments = get_comments(st, post_id).await?;

    let mut flat = Vec::with_capacity(comments.len() + 1);
    flat.push(post);
    flat.extend(comments);
    Ok(flat)
}

/// The root posts of `author`, newest first, each with its comment tree.
pub async fn get_posts(st: &AppState, author: &str) -> BlogResult<Vec<PostAndComments>> {
    let roots = st
        .round_trip("posts.find_roots_by_author", st.posts.find_roots_by_author(author))
        .await?;
    let subtrees = try_join_all(roots.iter().map(|root| get_post(st, root.id))).await?;
    unflatten(subtrees.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn post(id: u128, author: &str, parent: Option<u128>, minute: i64) -> Post {
        Post {
            id: Uuid::from_u128(id),
            author: author.into(),
            text: format!("post {id}"),
            response_to: parent.map(Uuid::from_u128),
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(minute),
        }
    }

    fn ids(nodes: &[PostAndComments]) -> Vec<u128> {
        nodes.iter().map(|n| n.id.as_u128()).collect()
    }

    #[test]
    fn chain_of_depth_d_yields_one_root() {
        // 1 <- 2 <- 3 <- 4 <- 5
        let flat: Vec<_> = (1..=5)
            .map(|i| post(i, "alice", (i > 1).then(|| i - 1), i as i64))
            .collect();
        let trees = unflatten(flat).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].descendant_count(), 4);

        let mut depth = 0;
        let mut node = &trees[0];
        while let Some(child) = node.children.first() {
            depth += 1;
            node = child;
        }
        assert_eq!(depth, 4);
    }

    #[test]
    fn siblings_keep_input_order() {
        // Parent-block-first order as produced by get_post.
        let flat = vec![
            post(1, "alice", None, 0),
            post(2, "bob", Some(1), 1),
            post(3, "carol", Some(1), 1),
            post(4, "dave", Some(1), 2),
            post(5, "alice", Some(2), 3),
            post(6, "erin", Some(3), 3),
        ];
        let trees = unflatten(flat).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].descendant_count(), 5);
        assert_eq!(ids(&trees[0].children), [2, 3, 4]);
        assert_eq!(ids(&trees[0].children[0].children), [5]);
        assert_eq!(ids(&trees[0].children[1].children), [6]);
        assert!(trees[0].children[2].children.is_empty());
    }

    #[test]
    fn parent_outside_input_makes_a_root() {
        let flat = vec![post(7, "bob", Some(1), 1), post(8, "alice", Some(7), 2)];
        let trees = unflatten(flat).unwrap();
        assert_eq!(ids(&trees), [7]);
        assert_eq!(ids(&trees[0].children), [8]);
    }

    #[test]
    fn several_roots_keep_their_order() {
        let flat = vec![
            post(10, "alice", None, 5),
            post(11, "bob", Some(10), 6),
            post(20, "alice", None, 1),
        ];
        let trees = unflatten(flat).unwrap();
        assert_eq!(ids(&trees), [10, 20]);
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let flat = vec![post(2, "bob", Some(1), 1), post(1, "alice", None, 0)];
        assert!(matches!(unflatten(flat), Err(BlogError::Validation(_))));
    }

    #[test]
    fn self_reply_and_duplicates_are_rejected() {
        assert!(unflatten(vec![post(1, "alice", Some(1), 0)]).is_err());
        assert!(unflatten(vec![post(1, "alice", None, 0), post(1, "alice", None, 0)]).is_err());
    }

    #[test]
    fn empty_input_yields_no_trees() {
        assert!(unflatten(Vec::new()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_come_parent_block_first() {
        let (st, stores) = AppState::fake();
        let root = stores.seed_post("alice", "root", None).await;
        let a = stores.seed_post("bob", "a", Some(root.id)).await;
        let b = stores.seed_post("carol", "b", Some(root.id)).await;
        let a1 = stores.seed_post("alice", "a1", Some(a.id)).await;
        let b1 = stores.seed_post("alice", "b1", Some(b.id)).await;
        let a2 = stores.seed_post("dave", "a2", Some(a.id)).await;

        let order: Vec<_> = get_comments(&st, root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(order, [a.id, b.id, a1.id, a2.id, b1.id]);

        let flat = get_post(&st, root.id).await.unwrap();
        assert_eq!(flat[0].id, root.id);
        assert_eq!(flat.len(), 6);
    }

    #[tokio::test]
    async fn get_post_of_missing_id_is_not_found() {
        let (st, _stores) = AppState::fake();
        assert!(matches!(
            get_post(&st, Uuid::new_v4()).await,
            Err(BlogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_posts_builds_one_tree_per_root() {
        let (st, stores) = AppState::fake();
        let first = stores.seed_post("alice", "first", None).await;
        let second = stores.seed_post("alice", "second", None).await;
        stores.seed_post("bob", "elsewhere", None).await;
        let reply = stores.seed_post("bob", "reply", Some(first.id)).await;
        stores.seed_post("alice", "nested", Some(reply.id)).await;

        let trees = get_posts(&st, "alice").await.unwrap();
        assert_eq!(trees.iter().map(|t| t.id).collect::<Vec<_>>(), [second.id, first.id]);
        assert!(trees[0].children.is_empty());
        assert_eq!(trees[1].descendant_count(), 2);
        assert_eq!(trees[1].children[0].id, reply.id);
    }
}
