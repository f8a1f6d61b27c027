// SPDX-License-Identifier: MIT

//! Credential store with typed operations.
//!
//! Backed by an in-process concurrent map keyed by lowercased email. Every
//! mutation runs under the map's per-entry lock, which gives the
//! read-modify-write atomicity the refresh-rotation flow depends on. A
//! relational store can replace this behind the same methods.

use crate::error::AppError;
use crate::models::User;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Credential store for user accounts.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<DashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an email for use as a store key.
    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    pub async fn create_user(&self, user: User) -> Result<(), AppError> {
        match self.users.entry(Self::key(&user.email)) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            )),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(user);
                Ok(())
            }
        }
    }

    /// Look up a user by email (case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&Self::key(email)).map(|u| u.value().clone()))
    }

    /// Find the user whose current refresh token equals `token`.
    ///
    /// Full scan; an indexed store would do this with a lookup.
    pub async fn find_user_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().refresh_token.as_deref() == Some(token))
            .map(|entry| entry.value().clone()))
    }

    /// Unconditionally set the user's refresh token and expiry.
    ///
    /// The token and its expiry are a single write; no path updates one
    /// without the other.
    pub async fn set_refresh_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&Self::key(email))
            .ok_or_else(|| AppError::Database("user disappeared during update".to_string()))?;
        user.refresh_token = Some(token.to_string());
        user.refresh_token_expires_at = Some(expires_at);
        Ok(())
    }

    /// Replace the user's refresh token only if the stored value still equals
    /// `expected`. Compare-and-swap under the entry lock: of two concurrent
    /// rotations presenting the same stale token, exactly one succeeds.
    pub async fn rotate_refresh_token(
        &self,
        email: &str,
        expected: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&Self::key(email))
            .ok_or(AppError::InvalidCredentials)?;
        if user.refresh_token.as_deref() != Some(expected) {
            return Err(AppError::InvalidCredentials);
        }
        user.refresh_token = Some(token.to_string());
        user.refresh_token_expires_at = Some(expires_at);
        Ok(())
    }

    /// All user accounts, for the admin listing.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.iter().map(|entry| entry.value().clone()).collect())
    }

    /// Number of registered accounts.
    pub async fn count_users(&self) -> Result<usize, AppError> {
        Ok(self.users.len())
    }

    /// Assign roles to a user (administrative path; used by tests to set up
    /// role-gated scenarios).
    pub async fn set_roles(&self, email: &str, roles: Vec<String>) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&Self::key(email))
            .ok_or_else(|| AppError::Database("no such user".to_string()))?;
        user.roles = roles;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(email: &str) -> User {
        User {
            id: "user-1".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            roles: vec![],
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let store = UserStore::new();
        store.create_user(test_user("a@x.com")).await.unwrap();

        let result = store.create_user(test_user("A@X.COM")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_refresh_rotation_single_winner() {
        let store = UserStore::new();
        store.create_user(test_user("a@x.com")).await.unwrap();

        let expiry = Utc::now() + chrono::Duration::days(7);
        store
            .set_refresh_token("a@x.com", "secret-1", expiry)
            .await
            .unwrap();

        // First rotation wins.
        store
            .rotate_refresh_token("a@x.com", "secret-1", "secret-2", expiry)
            .await
            .unwrap();

        // Second rotation with the superseded value loses.
        let result = store
            .rotate_refresh_token("a@x.com", "secret-1", "secret-3", expiry)
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));

        let user = store.get_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("secret-2"));
    }

    #[tokio::test]
    async fn test_find_by_refresh_token() {
        let store = UserStore::new();
        store.create_user(test_user("a@x.com")).await.unwrap();
        let expiry = Utc::now() + chrono::Duration::days(7);
        store
            .set_refresh_token("a@x.com", "opaque-secret", expiry)
            .await
            .unwrap();

        let found = store
            .find_user_by_refresh_token("opaque-secret")
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = store.find_user_by_refresh_token("other").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_token_and_expiry_written_together() {
        let store = UserStore::new();
        store.create_user(test_user("a@x.com")).await.unwrap();
        let expiry = Utc::now() + chrono::Duration::days(7);
        store
            .set_refresh_token("a@x.com", "secret", expiry)
            .await
            .unwrap();

        let user = store.get_user_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.refresh_token.is_some());
        assert!(user.refresh_token_expires_at.is_some());
    }
}
