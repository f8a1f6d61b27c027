// SPDX-License-Identifier: MIT

//! JWT authentication middleware and the per-route role gate.

use crate::error::AppError;
use crate::services::Claims;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

/// Authenticated identity extracted from a validated JWT.
///
/// Inserted into request extensions by `require_auth` and read by handlers
/// and the role gate; there is no ambient current-user state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Whether the token carried at least one of the given roles.
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        self.roles.iter().any(|r| allowed.contains(&r.as_str()))
    }
}

/// Middleware that requires a valid Bearer JWT.
///
/// Checks signature, expiry (zero leeway), issuer, and audience; any failure
/// is the same generic 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
        _ => return Err(AppError::InvalidCredentials),
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[&state.config.jwt_issuer]);
    validation.set_audience(&[&state.config.jwt_audience]);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| AppError::InvalidCredentials)?;

    let auth_user = AuthUser {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
        roles: token_data.claims.roles,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Role gate applied after `require_auth`.
///
/// Grants access iff the token's roles intersect `allowed`; an authenticated
/// identity without a matching role gets 403, distinct from the 401 cases.
/// Wired per-route in routes/api.rs from its route-to-roles table.
pub async fn check_roles(
    allowed: &'static [&'static str],
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::InvalidCredentials)?;

    if user.has_any_role(allowed) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(user_id = %user.user_id, required = ?allowed, "Role check failed");
        Err(AppError::Forbidden)
    }
}
