//! Account — a user identity with credentials and profile attributes.
//!
//! The password is only ever held as an argon2 PHC string and is skipped when
//! an [`Account`] is serialised.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum length of an email address, in characters.
pub const EMAIL_MAX_LEN: usize = 255;
/// Maximum length of a display name, in characters.
pub const NAME_MAX_LEN: usize = 255;
/// Maximum length of a raw (unhashed) password, in characters.
pub const PASSWORD_MAX_LEN: usize = 128;

/// A persisted account.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub email:         String,
  pub name:          String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub is_superuser:  bool,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  pub fn full_name(&self) -> &str { &self.name }

  pub fn short_name(&self) -> &str { &self.name }
}

impl fmt::Display for Account {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.email)
  }
}

/// Input for [`ProfileStore::insert_account`](crate::store::ProfileStore::insert_account).
///
/// The email must already be normalised and the password already hashed; the
/// [`manager`](crate::manager) functions take care of both.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub is_staff:      bool,
  pub is_superuser:  bool,
}

/// A set of column changes applied by
/// [`ProfileStore::update_account`](crate::store::ProfileStore::update_account).
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
  pub email:         Option<String>,
  pub name:          Option<String>,
  pub password_hash: Option<String>,
  pub is_active:     Option<bool>,
  pub is_staff:      Option<bool>,
  pub is_superuser:  Option<bool>,
}

impl AccountPatch {
  pub fn is_empty(&self) -> bool {
    self.email.is_none()
      && self.name.is_none()
      && self.password_hash.is_none()
      && self.is_active.is_none()
      && self.is_staff.is_none()
      && self.is_superuser.is_none()
  }
}

/// Lower-case the domain part of an email address.
///
/// The local part is case-sensitive per RFC 5321 and is kept as given. Input
/// without an `@` is returned unchanged.
pub fn normalize_email(email: &str) -> String {
  match email.rsplit_once('@') {
    Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
    None => email.to_owned(),
  }
}
