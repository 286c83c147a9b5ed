use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest, RegisteredResponse, TokenResponse},
        extractors::AuthUser,
        jwt::TokenKeys,
        services::register,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(get_user).post(create_user))
        .route("/token", get(get_token))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "rejected registration body");
        ApiError::BadRequest
    })?;

    let user = register(
        state.users.as_ref(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse { email: user.email }),
    ))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_token(
    State(keys): State<TokenKeys>,
    AuthUser(user): AuthUser,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = keys.issue(user.id)?;
    info!("token issued");
    Ok(Json(TokenResponse {
        token,
        duration: keys.ttl_seconds(),
    }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.find_by_id(user.id).await?.ok_or_else(|| {
        warn!("resolved user vanished");
        ApiError::BadRequest
    })?;

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}
