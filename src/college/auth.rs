// SPDX-License-Identifier: MIT

//! Password digests, bearer tokens and the authenticated-user extractor

use crate::college::entity::{Role, User};
use crate::error::AppError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Lowercase hex SHA-256 of the password, the stored credential format
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies HS256 tokens
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.user_id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| AppError::other(format!("token encoding failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::unauthorized("token expired"),
                _ => AppError::unauthorized(format!("invalid token: {e}")),
            })
    }
}

/// The caller identified by a valid `Authorization: Bearer <token>` header
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("malformed authorization header"))?;

    let token = match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => "",
    };
    if token.is_empty() {
        return Err(AppError::unauthorized("missing bearer token"));
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenIssuer::from_ref(state);
        let claims = tokens.verify(bearer_token(parts)?)?;
        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn user(role: Role) -> User {
        User {
            user_id: 42,
            username: "zhangsan".to_string(),
            password: hash_password("password123"),
            province: "湖南".to_string(),
            city: "长沙".to_string(),
            address: "岳麓区".to_string(),
            role,
            location: "112.9,28.2".to_string(),
            citycode: "0731".to_string(),
            adcode: 430104,
        }
    }

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("password123"),
            "ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f"
        );
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("secret", 24);
        let token = issuer.issue(&user(Role::Admin)).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "zhangsan");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("secret", -2);
        let token = issuer.issue(&user(Role::User)).unwrap();
        let err = issuer.verify(&token).unwrap_err();
        let AppError::Unauthorized(message) = err else {
            panic!("expected an unauthorized error");
        };
        assert_eq!(message, "token expired");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let issuer = TokenIssuer::new("secret", 24);
        let token = issuer.issue(&user(Role::User)).unwrap();
        let other = TokenIssuer::new("another-secret", 24);
        let forged = other.verify(&token);
        assert!(matches!(forged, Err(AppError::Unauthorized(_))));
        let garbage = other.verify("not-a-token");
        assert!(matches!(garbage, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let (parts, _) = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        let missing = bearer_token(&parts);
        assert!(matches!(missing, Err(AppError::Unauthorized(_))));

        let (parts, _) = Request::builder()
            .header("Authorization", "Basic Zm9vOmJhcg==")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_err());
    }
}
