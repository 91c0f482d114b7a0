//! Account lifecycle: creation, self-update and login.
//!
//! These functions sit between the API and a [`ProfileStore`]. They own the
//! rules the store does not enforce on its own: email normalisation, password
//! hashing, and the privileged-account flags.

use uuid::Uuid;

use crate::{
  Error,
  account::{Account, AccountPatch, NewAccount, normalize_email},
  password::{hash_password_blocking, unusable_password, verify_password_blocking},
  store::ProfileStore,
  token::AuthToken,
};

/// Changes an account holder may make to their own account.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
  pub email:    Option<String>,
  pub name:     Option<String>,
  /// Raw password; hashed before it reaches the store.
  pub password: Option<String>,
}

/// Create a regular account.
///
/// Without a password the account gets an unusable one and cannot log in
/// until a password is set.
pub async fn create_account<S: ProfileStore>(
  store:    &S,
  email:    &str,
  name:     &str,
  password: Option<&str>,
) -> Result<Account, S::Error> {
  if email.is_empty() {
    return Err(Error::validation("email", "User must have an email address").into());
  }

  let password_hash = match password {
    Some(p) => hash_password_blocking(p.to_owned()).await?,
    None => unusable_password(),
  };

  let account = store
    .insert_account(NewAccount {
      email: normalize_email(email),
      name: name.to_owned(),
      password_hash,
      is_staff: false,
      is_superuser: false,
    })
    .await?;

  tracing::info!(account_id = %account.account_id, "created account");
  Ok(account)
}

/// Create an account with staff and superuser rights. A password is required.
pub async fn create_privileged_account<S: ProfileStore>(
  store:    &S,
  email:    &str,
  name:     &str,
  password: &str,
) -> Result<Account, S::Error> {
  let account = create_account(store, email, name, Some(password)).await?;

  let account = store
    .update_account(account.account_id, AccountPatch {
      is_staff: Some(true),
      is_superuser: Some(true),
      ..Default::default()
    })
    .await?;

  tracing::info!(account_id = %account.account_id, "granted staff and superuser");
  Ok(account)
}

/// Apply `changes` to an account. A present password is re-hashed; an absent
/// one leaves the stored hash alone.
pub async fn update_account<S: ProfileStore>(
  store:   &S,
  id:      Uuid,
  changes: AccountChanges,
) -> Result<Account, S::Error> {
  let password_hash = match changes.password {
    Some(p) => Some(hash_password_blocking(p).await?),
    None => None,
  };

  let patch = AccountPatch {
    email: changes.email.as_deref().map(normalize_email),
    name: changes.name,
    password_hash,
    ..Default::default()
  };

  if patch.is_empty() {
    return store
      .get_account(id)
      .await?
      .ok_or_else(|| Error::AccountNotFound(id).into());
  }

  store.update_account(id, patch).await
}

/// Exchange credentials for the account's token, creating it on first login.
///
/// An unknown email still pays for one argon2 verification.
pub async fn obtain_token<S: ProfileStore>(
  store:    &S,
  email:    &str,
  password: &str,
) -> Result<AuthToken, S::Error> {
  let account = store.find_account_by_email(&normalize_email(email)).await?;
  let stored = account.as_ref().map(|a| a.password_hash.clone());
  let matches = verify_password_blocking(password.to_owned(), stored).await?;

  let account = account
    .filter(|a| matches && a.is_active)
    .ok_or(Error::InvalidCredentials)?;

  let token = store
    .get_or_insert_token(AuthToken::generate(account.account_id))
    .await?;

  tracing::info!(account_id = %account.account_id, "issued login token");
  Ok(token)
}
