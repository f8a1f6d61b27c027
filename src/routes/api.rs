// SPDX-License-Identifier: MIT

//! API routes for authenticated users.
//!
//! The resource controllers proper (contacts, leads, posts, media) live in
//! their own services; what this module owns is the identity echo and the
//! role-gated admin/report surface, wired from a single route-to-roles
//! table so the gate policy stays in one place.

use crate::error::Result;
use crate::middleware::auth::{check_roles, AuthUser};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Which roles may reach which role-gated route.
const ROUTE_ROLES: &[(&str, &'static [&'static str])] = &[
    ("/api/v1/admin/users", &["Admin"]),
    ("/api/v1/reports/accounts", &["Admin", "Sales"]),
];

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    let mut router = Router::new().route("/api/v1/users/me", get(get_me));

    for (path, allowed) in ROUTE_ROLES.iter().copied() {
        let handler = match path {
            "/api/v1/admin/users" => get(list_users),
            _ => get(account_report),
        };
        router = router.merge(Router::new().route(path, handler).route_layer(
            middleware::from_fn(move |req: Request, next: Next| check_roles(allowed, req, next)),
        ));
    }

    router
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// Echo the identity the auth middleware injected.
async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
        roles: user.roles,
    })
}

// ─── Admin / Reports ─────────────────────────────────────────

/// User account summary for the admin listing. Never carries the hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    pub created_at: String,
}

/// List all user accounts (Admin only).
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserSummary>>> {
    let users = state.users.list_users().await?;
    let summaries = users
        .into_iter()
        .map(|u| UserSummary {
            user_id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            roles: u.roles,
            created_at: format_utc_rfc3339(u.created_at),
        })
        .collect();
    Ok(Json(summaries))
}

/// Account totals report (Admin or Sales).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
    pub total_users: usize,
}

async fn account_report(State(state): State<Arc<AppState>>) -> Result<Json<AccountReport>> {
    let total_users = state.users.count_users().await?;
    Ok(Json(AccountReport { total_users }))
}
