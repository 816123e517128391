use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        services::{authenticate_user, create_user},
    },
    dto::Ack,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Json<Ack> {
    let ok = create_user(
        &state,
        &payload.username,
        &payload.password,
        payload.email.as_deref(),
    )
    .await;
    Json(Ack { ok })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Json<TokenResponse> {
    let token = authenticate_user(&state, &payload.username, &payload.password).await;
    Json(TokenResponse { token })
}
