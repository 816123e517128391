use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{Blog, SettingsUpdate, UserSettings},
    services::{get_all_blogs, get_user_settings, update_user_settings},
};
use crate::{context::Context, dto::Ack, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/settings", get(read_settings).put(write_settings))
}

#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> Json<Option<Vec<Blog>>> {
    Json(get_all_blogs(&state).await)
}

#[instrument(skip(state))]
pub async fn read_settings(
    State(state): State<AppState>,
    ctx: Context,
) -> Json<Option<UserSettings>> {
    Json(get_user_settings(&state, &ctx).await)
}

#[instrument(skip(state, body))]
pub async fn write_settings(
    State(state): State<AppState>,
    ctx: Context,
    Json(body): Json<SettingsUpdate>,
) -> Json<Ack> {
    Json(update_user_settings(&state, &ctx, &body).await.into())
}
