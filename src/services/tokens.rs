// SPDX-License-Identifier: MIT

//! Access-token issuance and refresh-token rotation.
//!
//! Every successful issuance writes a fresh refresh token (and its expiry)
//! onto the user record before the result is returned, so no access token is
//! ever handed out without a durable refresh token behind it.

use crate::config::Config;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email address
    pub email: String,
    /// Unique token ID, fresh per token
    pub jti: String,
    /// Role names, sorted and deduplicated
    pub roles: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Result of a successful token issuance.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues signed access tokens and rotates refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    signing_key: Vec<u8>,
    issuer: String,
    audience: String,
    expiry_minutes: i64,
    refresh_validity_days: i64,
    users: UserStore,
}

impl TokenService {
    pub fn new(config: &Config, users: UserStore) -> Self {
        Self {
            signing_key: config.jwt_signing_key.clone(),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiry_minutes: config.jwt_expiry_minutes,
            refresh_validity_days: config.refresh_token_validity_days,
            users,
        }
    }

    /// Issue tokens for a login or registration.
    ///
    /// Overwrites whatever refresh token the user had before.
    pub async fn issue(&self, user: &User) -> Result<IssuedTokens, AppError> {
        let tokens = self.build_tokens(user)?;
        self.users
            .set_refresh_token(&user.email, &tokens.refresh_token, tokens.refresh_expires_at)
            .await?;
        Ok(tokens)
    }

    /// Issue tokens for a refresh, rotating away the presented token.
    ///
    /// The store swap is conditional on `presented` still being current, so
    /// concurrent refreshes with the same token produce exactly one winner.
    pub async fn issue_rotating(
        &self,
        user: &User,
        presented: &str,
    ) -> Result<IssuedTokens, AppError> {
        let tokens = self.build_tokens(user)?;
        self.users
            .rotate_refresh_token(
                &user.email,
                presented,
                &tokens.refresh_token,
                tokens.refresh_expires_at,
            )
            .await?;
        Ok(tokens)
    }

    /// Build a signed access token and a fresh refresh token. Pure
    /// computation; nothing is persisted here.
    fn build_tokens(&self, user: &User) -> Result<IssuedTokens, AppError> {
        let now = Utc::now();
        let access_expires_at = now + Duration::minutes(self.expiry_minutes);
        let refresh_expires_at = now + Duration::days(self.refresh_validity_days);

        let mut roles = user.roles.clone();
        roles.sort();
        roles.dedup();

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            roles,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp() as usize,
            exp: access_expires_at.timestamp() as usize,
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT signing failed: {}", e)))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            access_expires_at,
            refresh_expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn test_user(roles: &[&str]) -> User {
        User {
            id: "user-1".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn decode_claims(token: &str, config: &Config) -> Claims {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&config.jwt_signing_key),
            &validation,
        )
        .expect("token should decode")
        .claims
    }

    #[tokio::test]
    async fn test_issuance_persists_refresh_token_first() {
        let config = Config::test_default();
        let store = UserStore::new();
        let user = test_user(&[]);
        store.create_user(user.clone()).await.unwrap();

        let service = TokenService::new(&config, store.clone());
        let tokens = service.issue(&user).await.unwrap();

        let stored = store.get_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(tokens.refresh_token.as_str()));
        assert_eq!(stored.refresh_token_expires_at, Some(tokens.refresh_expires_at));
        assert!(tokens.refresh_expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_roles_sorted_and_deduplicated() {
        let config = Config::test_default();
        let store = UserStore::new();
        let user = test_user(&["Sales", "Admin", "Sales"]);
        store.create_user(user.clone()).await.unwrap();

        let service = TokenService::new(&config, store);
        let tokens = service.issue(&user).await.unwrap();

        let claims = decode_claims(&tokens.access_token, &config);
        assert_eq!(claims.roles, vec!["Admin".to_string(), "Sales".to_string()]);
    }

    #[tokio::test]
    async fn test_claims_carry_identity_and_uniqueness() {
        let config = Config::test_default();
        let store = UserStore::new();
        let user = test_user(&[]);
        store.create_user(user.clone()).await.unwrap();

        let service = TokenService::new(&config, store);
        let first = service.issue(&user).await.unwrap();
        let second = service.issue(&user).await.unwrap();

        let c1 = decode_claims(&first.access_token, &config);
        let c2 = decode_claims(&second.access_token, &config);
        assert_eq!(c1.sub, "user-1");
        assert_eq!(c1.email, "a@x.com");
        assert_ne!(c1.jti, c2.jti);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_rotation_fails_when_presented_token_is_stale() {
        let config = Config::test_default();
        let store = UserStore::new();
        let user = test_user(&[]);
        store.create_user(user.clone()).await.unwrap();

        let service = TokenService::new(&config, store.clone());
        let first = service.issue(&user).await.unwrap();

        // Rotate once with the current token.
        let second = service
            .issue_rotating(&user, &first.refresh_token)
            .await
            .unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        // The superseded token can no longer rotate.
        let result = service.issue_rotating(&user, &first.refresh_token).await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }
}
