use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use shared::{Credentials, DataResponse, LoginData, MessageResponse, User};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<User>>), ApiError> {
    let Json(credentials) = payload?;
    let user = state.auth.register(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_data("User registered successfully", user)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<DataResponse<LoginData>>, ApiError> {
    let Json(credentials) = payload?;
    let login = state.auth.login(credentials).await?;
    Ok(Json(DataResponse::new(login)))
}

pub async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<MessageResponse<()>>, ApiError> {
    state.auth.logout(&caller.token).await?;
    tracing::info!(user_id = %caller.id, "token revoked");
    Ok(Json(MessageResponse::message("Logged out successfully")))
}

/// The user behind the presented token.
pub async fn me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let user = state
        .auth
        .user(caller.id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(DataResponse::new(user)))
}
