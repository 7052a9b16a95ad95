use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

pub mod password;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            username: username.into(),
            is_admin,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

/// Signs a token for the given user.
pub fn create_token(username: &str, is_admin: bool) -> Result<String, JwtError> {
    generate_jwt(Claims::new(username, is_admin))
}

pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verifies signature and expiry, returning the claims.
pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}
