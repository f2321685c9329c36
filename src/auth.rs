//! Password hashing and bearer tokens.
//!
//! A request is either unauthenticated (no, malformed, invalid or expired
//! token: rejected with 401) or authenticated, in which case [`AuthUser`]
//! carries the resolved user id into the handler. Expiry is the only way a
//! token stops working.

use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Unexpected(format!("password hashing failed: {e}")))
}

/// Constant-time comparison through the argon2 verifier. A stored hash that
/// does not parse never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    remember_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64, remember_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
            remember_ttl: Duration::seconds(remember_ttl_secs),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_ttl_secs,
            config.jwt_remember_ttl_secs,
        )
    }

    pub fn issue(&self, user_id: &str, remember_me: bool) -> Result<String, AppError> {
        self.issue_at(user_id, remember_me, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        remember_me: bool,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let ttl = if remember_me { self.remember_ttl } else { self.ttl };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Unexpected(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("rejected bearer token: {e}");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token expired")
                    }
                    _ => AppError::unauthorized("Invalid token"),
                }
            })
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;
        let claims = state.tokens.verify(token)?;

        let data = state.data.lock().await;
        if !data.users.contains_key(&claims.sub) {
            return Err(AppError::unauthorized("User no longer exists"));
        }

        Ok(Self {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 60, 3_600)
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("secret123", ""));
        assert!(!verify_password("secret123", "not-a-phc-string"));
    }

    #[test]
    fn fresh_token_verifies() {
        let token = issuer().issue("user-1", false).unwrap();
        let claims = issuer().verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn short_token_expires_while_remembered_token_survives() {
        let issued = Utc::now() - Duration::seconds(120);
        let short = issuer().issue_at("user-1", false, issued).unwrap();
        let long = issuer().issue_at("user-1", true, issued).unwrap();

        let err = issuer().verify(&short).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
        assert_eq!(issuer().verify(&long).unwrap().sub, "user-1");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenIssuer::new("other", 60, 60).issue("user-1", false).unwrap();
        let err = issuer().verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }
}
