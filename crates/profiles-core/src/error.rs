//! Error types for `profiles-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A single field failed validation before anything was persisted.
  #[error("{field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("an account with email {0:?} already exists")]
  DuplicateEmail(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("feed item not found: {0}")]
  FeedItemNotFound(Uuid),

  #[error("unable to log in with provided credentials")]
  InvalidCredentials,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
