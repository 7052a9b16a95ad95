use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Bcrypt hash at the configured cost.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let cost = config::config().security.password_hash_cost;
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(password, hash)?)
}

/// `hash_password` on the blocking pool; bcrypt is too slow for an executor thread.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
}
