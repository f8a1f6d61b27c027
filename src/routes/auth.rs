// SPDX-License-Identifier: MIT

//! Registration, login, and refresh-token routes.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::{password, IssuedTokens};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
}

/// Registration request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication result returned by all three endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    /// Access-token expiry, RFC3339 UTC
    pub expiration: String,
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
}

fn auth_response(user: &User, tokens: IssuedTokens) -> AuthResponse {
    let mut roles = user.roles.clone();
    roles.sort();
    roles.dedup();

    AuthResponse {
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expiration: format_utc_rfc3339(tokens.access_expires_at),
        user_id: user.id.clone(),
        email: user.email.clone(),
        roles,
    }
}

/// Create an account and immediately issue tokens for it.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = password::hash_password(&payload.password).await?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: payload.email.trim().to_string(),
        password_hash,
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        roles: vec![],
        refresh_token: None,
        refresh_token_expires_at: None,
        created_at: Utc::now(),
    };

    state.users.create_user(user.clone()).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    let tokens = state.tokens.issue(&user).await?;
    Ok(Json(auth_response(&user, tokens)))
}

/// Exchange email + password for tokens.
///
/// Unknown email and wrong password return the identical 401; the unknown
/// path still burns a hash so its latency matches.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = match state.users.get_user_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            password::dummy_verify(&payload.password).await;
            return Err(AppError::InvalidCredentials);
        }
    };

    if !password::verify_password(&payload.password, &user.password_hash).await? {
        tracing::debug!("Login failed: password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let tokens = state.tokens.issue(&user).await?;
    Ok(Json(auth_response(&user, tokens)))
}

/// Exchange a still-valid refresh token for fresh tokens, rotating it.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .users
        .find_user_by_refresh_token(&payload.refresh_token)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    // Expiry exactly at "now" is already too late.
    match user.refresh_token_expires_at {
        Some(expires_at) if expires_at > Utc::now() => {}
        _ => {
            tracing::debug!(user_id = %user.id, "Refresh token expired");
            return Err(AppError::InvalidCredentials);
        }
    }

    let tokens = state
        .tokens
        .issue_rotating(&user, &payload.refresh_token)
        .await?;

    tracing::info!(user_id = %user.id, "Refresh token rotated");

    Ok(Json(auth_response(&user, tokens)))
}
