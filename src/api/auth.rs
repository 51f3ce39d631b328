//! Account endpoints: register, login, logout, user info, password change

use axum::{extract::State, http::HeaderMap, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use super::MessageResponse;
use crate::models::UserRole;
use crate::services::{ChangePasswordInput, LoginInput, RegisterInput};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

/// Routes that manage their own session handling
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes that need a resolved session
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/user_info", post(user_info))
        .route("/change_password", post(change_password))
}

/// POST /api/v1/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, session) = state
        .user_service
        .register(RegisterInput::new(body.username, body.password))
        .await?;

    Ok((
        state.cookie.set(&session.id)?,
        Json(MessageResponse::new("Registration successful")),
    ))
}

/// POST /api/v1/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .user_service
        .login(LoginInput::new(body.username, body.password))
        .await?;

    Ok((
        state.cookie.set(&session.id)?,
        Json(MessageResponse::new("Login successful")),
    ))
}

/// POST /api/v1/logout
///
/// Needs the cookie but not a live session, so a repeated logout succeeds.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .cookie
        .token(&headers)
        .ok_or_else(ApiError::missing_session)?;

    state.user_service.logout(&token).await?;

    Ok((
        state.cookie.clear()?,
        Json(MessageResponse::new("Logout successful")),
    ))
}

/// POST /api/v1/user_info
async fn user_info(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    })
}

/// POST /api/v1/change_password
async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .change_password(
            &user,
            ChangePasswordInput::new(body.old_password, body.new_password),
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}
