//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account stored in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (UUID assigned at registration)
    pub id: String,
    /// Email address, unique case-insensitively
    pub email: String,
    /// Argon2 PHC hash of the password; never logged or returned
    pub password_hash: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Assigned role names (empty for self-registered users)
    pub roles: Vec<String>,
    /// Current refresh token, if any.
    /// Always written together with `refresh_token_expires_at`.
    pub refresh_token: Option<String>,
    /// When the current refresh token expires
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}
