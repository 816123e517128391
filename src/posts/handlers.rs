use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    delete::delete_post,
    dto::{CreatePostRequest, EditPostRequest},
    repo_types::{Post, PostAndComments},
    services,
};
use crate::{context::Context, dto::Ack, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs/:user/posts", get(get_posts))
        .route("/blogs/:user/posts/all", get(get_all_posts))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/:id", put(edit_post).delete(remove_post))
}

#[instrument(skip(state))]
pub async fn get_posts(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<Option<Vec<PostAndComments>>> {
    Json(services::get_posts(&state, &user).await)
}

#[instrument(skip(state))]
pub async fn get_all_posts(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<Option<Vec<Post>>> {
    Json(services::get_all_posts(&state, &user).await)
}

#[instrument(skip(state, body))]
pub async fn create_post(
    State(state): State<AppState>,
    ctx: Context,
    Json(body): Json<CreatePostRequest>,
) -> Json<Option<PostAndComments>> {
    Json(services::create_post(&state, &ctx, &body.text, body.response_to).await)
}

#[instrument(skip(state, body))]
pub async fn edit_post(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<Uuid>,
    Json(body): Json<EditPostRequest>,
) -> Json<Option<PostAndComments>> {
    Json(services::edit_post(&state, &ctx, id, &body.text).await)
}

#[instrument(skip(state))]
pub async fn remove_post(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<Uuid>,
) -> Json<Ack> {
    Json(delete_post(&state, &ctx, id).await.into())
}
