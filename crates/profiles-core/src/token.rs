//! Opaque bearer tokens issued at login.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::Serialize;
use uuid::Uuid;

/// Number of random bytes behind a token key; the key is their hex encoding.
pub const TOKEN_KEY_BYTES: usize = 20;

/// A login token. Each account has at most one.
#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
  pub key:        String,
  pub account_id: Uuid,
  pub created_at: DateTime<Utc>,
}

impl AuthToken {
  /// Mint a fresh token for `account_id`.
  pub fn generate(account_id: Uuid) -> Self {
    let mut bytes = [0u8; TOKEN_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self {
      key: hex::encode(bytes),
      account_id,
      created_at: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_is_forty_lowercase_hex_chars() {
    let token = AuthToken::generate(Uuid::new_v4());
    assert_eq!(token.key.len(), TOKEN_KEY_BYTES * 2);
    assert!(token.key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
  }

  #[test]
  fn keys_are_unique() {
    let id = Uuid::new_v4();
    assert_ne!(AuthToken::generate(id).key, AuthToken::generate(id).key);
  }
}
