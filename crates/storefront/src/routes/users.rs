//! Account route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use comfycart_core::UserId;
use comfycart_core::api::{
    EditProfileRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserView,
};

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// POST /api/user/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    AuthService::new(state.users()).register(&req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "New user registered".to_owned(),
        }),
    ))
}

/// POST /api/user/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.users()).login(&req).await?;
    let token = state.tokens().issue(user.id, &user.name, Utc::now())?;
    Ok(Json(LoginResponse {
        token,
        id: user.id,
        name: user.name,
    }))
}

/// GET /api/user/
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserView>>> {
    let users = state.users().list().await?;
    Ok(Json(users.iter().map(crate::models::User::view).collect()))
}

/// GET /api/user/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>> {
    let not_found = || AppError::NotFound("User not found".to_owned());
    let id: UserId = id.parse().map_err(|_| not_found())?;
    let user = state.users().get_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(user.view()))
}

/// PATCH /api/user/edit
#[instrument(skip_all, fields(user_id = %auth.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(req): ApiJson<EditProfileRequest>,
) -> Result<Json<UserView>> {
    let user = AuthService::new(state.users())
        .edit_profile(auth.id, &req)
        .await?;
    Ok(Json(user.view()))
}
