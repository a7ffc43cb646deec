use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        errors::AuthError,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

fn bad_body(e: JsonRejection) -> AuthError {
    warn!(error = %e, "invalid request body");
    AuthError::InvalidInput("invalid request".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let cancel = state.shutdown.child_token();
    let resp = state.auth.register(&cancel, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let cancel = state.shutdown.child_token();
    let resp = state.auth.login(&cancel, payload).await?;
    Ok(Json(resp))
}

/// Public lookup: the bearer token, if any, is not inspected.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, AuthError> {
    let cancel = state.shutdown.child_token();
    let user = state.auth.get_by_id(&cancel, &id).await?;
    Ok(Json(user))
}
