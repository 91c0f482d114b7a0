//! The `ProfileStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `profiles-store-sqlite`).
//! The API crate depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  account::{Account, AccountPatch, NewAccount},
  feed::{FeedItem, NewFeedItem},
  token::AuthToken,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Bound on backend error types.
///
/// Backends wrap [`Error`] so that domain failures (duplicate email, missing
/// record) survive the trip through the store and can be told apart from
/// infrastructure failures by callers.
pub trait StoreError: std::error::Error + From<Error> + Send + Sync + 'static {
  /// The domain error behind this failure, if there is one.
  fn as_core(&self) -> Option<&Error>;
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ProfileStore::list_accounts`].
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
  /// Free-text search over name and email. Split into terms on whitespace
  /// and commas; every term must match one of the two fields.
  pub search: Option<String>,
}

impl AccountQuery {
  pub fn terms(&self) -> Vec<String> {
    self
      .search
      .as_deref()
      .map(|s| {
        s.replace('\0', "")
          .split(|c: char| c.is_whitespace() || c == ',')
          .filter(|t| !t.is_empty())
          .map(str::to_owned)
          .collect()
      })
      .unwrap_or_default()
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a profiles store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ProfileStore: Send + Sync {
  type Error: StoreError;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. Fails with [`Error::DuplicateEmail`] if the email
  /// is already taken, compared case-insensitively.
  fn insert_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email.
  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// List accounts in creation order, filtered by `query`.
  fn list_accounts<'a>(
    &'a self,
    query: &'a AccountQuery,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + 'a;

  /// Apply `patch` and return the updated account.
  ///
  /// Fails with [`Error::AccountNotFound`] or [`Error::DuplicateEmail`].
  fn update_account(
    &self,
    id: Uuid,
    patch: AccountPatch,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Delete an account together with its feed items and token.
  fn delete_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Feed items ────────────────────────────────────────────────────────

  /// Persist a new feed item. `created_on` is set by the store.
  fn insert_feed_item(
    &self,
    input: NewFeedItem,
  ) -> impl Future<Output = Result<FeedItem, Self::Error>> + Send + '_;

  fn get_feed_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FeedItem>, Self::Error>> + Send + '_;

  /// List feed items in creation order, optionally for a single owner.
  fn list_feed_items(
    &self,
    owner_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<FeedItem>, Self::Error>> + Send + '_;

  /// Replace the status text of a feed item. Owner and `created_on` are kept.
  fn update_feed_item(
    &self,
    id: Uuid,
    status_text: String,
  ) -> impl Future<Output = Result<FeedItem, Self::Error>> + Send + '_;

  fn delete_feed_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Tokens ────────────────────────────────────────────────────────────

  /// Return the token for `account_id`, inserting `candidate` if the account
  /// has none yet.
  fn get_or_insert_token(
    &self,
    candidate: AuthToken,
  ) -> impl Future<Output = Result<AuthToken, Self::Error>> + Send + '_;

  /// Resolve a token key to the account it was issued to.
  fn account_for_token<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;
}
