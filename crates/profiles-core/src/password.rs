//! One-way password hashing with argon2.
//!
//! Hashing and verification are CPU-bound. Async callers go through
//! [`hash_password_blocking`] and [`verify_password_blocking`], which run the
//! work on tokio's blocking pool.

use std::sync::LazyLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::{OsRng, RngCore as _};

use crate::{Error, Result};

/// Prefix marking a stored hash that no password can match.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// A random marker stored for accounts created without a password.
pub fn unusable_password() -> String {
  let mut bytes = [0u8; 20];
  OsRng.fill_bytes(&mut bytes);
  format!("{UNUSABLE_PASSWORD_PREFIX}{}", hex::encode(bytes))
}

pub fn is_usable(stored: &str) -> bool {
  !stored.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Check `password` against a stored hash. Unusable or malformed hashes never
/// verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
  if !is_usable(stored) {
    return false;
  }
  match PasswordHash::new(stored) {
    Ok(parsed) => Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok(),
    Err(e) => {
      tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
      false
    }
  }
}

/// A real argon2 hash of a throwaway secret. Logins for unknown emails verify
/// against it so they cost the same as logins for known ones.
static DUMMY_HASH: LazyLock<String> =
  LazyLock::new(|| hash_password("profiles-dummy-password").unwrap_or_default());

pub fn dummy_hash() -> &'static str { &DUMMY_HASH }

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| Error::PasswordHash(e.to_string()))?
}

/// [`verify_password`] on the blocking pool. `None` checks against
/// [`dummy_hash`] and always fails.
pub async fn verify_password_blocking(
  password: String,
  stored:   Option<String>,
) -> Result<bool> {
  tokio::task::spawn_blocking(move || match stored {
    Some(stored) => verify_password(&password, &stored),
    None => {
      verify_password(&password, dummy_hash());
      false
    }
  })
  .await
  .map_err(|e| Error::PasswordHash(e.to_string()))
}
