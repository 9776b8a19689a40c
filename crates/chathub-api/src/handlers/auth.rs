//! Auth handlers: register, login, me.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use chathub_core::error::AppError;
use chathub_entity::user::CreateUser;

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, LoginResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let password_hash = state.password_hasher.hash_password(&req.password)?;

    let user = state
        .user_repo
        .create(CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            display_name: req.display_name,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(Json(ApiResponse::ok(user.into())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = state
        .user_repo
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::authentication("Invalid username or password"))?;

    let verified = state
        .password_hasher
        .verify_password(&req.password, &user.password_hash)?;
    if !verified {
        return Err(AppError::authentication("Invalid username or password").into());
    }

    let (access_token, expires_at) = state
        .jwt_encoder
        .generate_access_token(user.id, &user.username)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token,
        expires_at,
        user: user.into(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User no longer exists"))?;

    Ok(Json(ApiResponse::ok(user.into())))
}
