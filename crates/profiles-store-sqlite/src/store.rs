//! [`SqliteStore`] — the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use profiles_core::{
  account::{Account, AccountPatch, NewAccount},
  feed::{FeedItem, NewFeedItem},
  store::{AccountQuery, ProfileStore},
  token::AuthToken,
};

use crate::{
  encode::{
    ACCOUNT_COLUMNS, FEED_ITEM_COLUMNS, RawAccount, RawFeedItem, RawToken,
    contains_pattern, encode_dt, encode_uuid, raw_account, raw_feed_item,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Result of a check-then-write closure run on the connection thread.
enum Outcome<T> {
  Done(T),
  Missing,
  DuplicateEmail,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A profiles store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn insert_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      account_id:    Uuid::new_v4(),
      email:         input.email,
      name:          input.name,
      password_hash: input.password_hash,
      is_active:     true,
      is_staff:      input.is_staff,
      is_superuser:  input.is_superuser,
      created_at:    Utc::now(),
    };

    let id_str       = encode_uuid(account.account_id);
    let email        = account.email.clone();
    let name         = account.name.clone();
    let hash         = account.password_hash.clone();
    let is_staff     = account.is_staff;
    let is_superuser = account.is_superuser;
    let at_str       = encode_dt(account.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO accounts (
             account_id, email, name, password_hash,
             is_active, is_staff, is_superuser, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7)",
          rusqlite::params![id_str, email, name, hash, is_staff, is_superuser, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(profiles_core::Error::DuplicateEmail(account.email).into());
    }
    Ok(account)
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
            rusqlite::params![id_str],
            raw_account,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let email = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            rusqlite::params![email],
            raw_account,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn list_accounts(&self, query: &AccountQuery) -> Result<Vec<Account>> {
    let patterns: Vec<String> =
      query.terms().iter().map(|t| contains_pattern(t)).collect();

    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        // Every term must match name or email.
        let conds: Vec<String> = (1..=patterns.len())
          .map(|n| {
            format!("(name LIKE ?{n} ESCAPE '\\' OR email LIKE ?{n} ESCAPE '\\')")
          })
          .collect();

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {ACCOUNT_COLUMNS} FROM accounts {where_clause} ORDER BY rowid"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(patterns.iter()), raw_account)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  async fn update_account(&self, id: Uuid, patch: AccountPatch) -> Result<Account> {
    let id_str    = encode_uuid(id);
    let new_email = patch.email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE account_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(Outcome::Missing);
        }

        if let Some(email) = &patch.email {
          let taken = tx
            .query_row(
              "SELECT 1 FROM accounts WHERE email = ?1 AND account_id != ?2",
              rusqlite::params![email, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Ok(Outcome::DuplicateEmail);
          }
        }

        tx.execute(
          "UPDATE accounts SET
             email         = COALESCE(?2, email),
             name          = COALESCE(?3, name),
             password_hash = COALESCE(?4, password_hash),
             is_active     = COALESCE(?5, is_active),
             is_staff      = COALESCE(?6, is_staff),
             is_superuser  = COALESCE(?7, is_superuser)
           WHERE account_id = ?1",
          rusqlite::params![
            id_str,
            patch.email,
            patch.name,
            patch.password_hash,
            patch.is_active,
            patch.is_staff,
            patch.is_superuser,
          ],
        )?;

        let raw = tx.query_row(
          &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
          rusqlite::params![id_str],
          raw_account,
        )?;
        tx.commit()?;
        Ok(Outcome::Done(raw))
      })
      .await?;

    match outcome {
      Outcome::Done(raw) => raw.into_account(),
      Outcome::Missing => Err(profiles_core::Error::AccountNotFound(id).into()),
      Outcome::DuplicateEmail => Err(
        profiles_core::Error::DuplicateEmail(new_email.unwrap_or_default()).into(),
      ),
    }
  }

  async fn delete_account(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM accounts WHERE account_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(profiles_core::Error::AccountNotFound(id).into());
    }
    Ok(())
  }

  // ── Feed items ────────────────────────────────────────────────────────────

  async fn insert_feed_item(&self, input: NewFeedItem) -> Result<FeedItem> {
    let item = FeedItem {
      item_id:     Uuid::new_v4(),
      owner_id:    input.owner_id,
      status_text: input.status_text,
      created_on:  Utc::now(),
    };

    let id_str    = encode_uuid(item.item_id);
    let owner_str = encode_uuid(item.owner_id);
    let text      = item.status_text.clone();
    let at_str    = encode_dt(item.created_on);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let owner_exists = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE account_id = ?1",
            rusqlite::params![owner_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !owner_exists {
          return Ok(Outcome::Missing);
        }

        tx.execute(
          "INSERT INTO feed_items (item_id, owner_id, status_text, created_on)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, owner_str, text, at_str],
        )?;
        tx.commit()?;
        Ok(Outcome::Done(()))
      })
      .await?;

    match outcome {
      Outcome::Done(()) => Ok(item),
      _ => Err(profiles_core::Error::AccountNotFound(item.owner_id).into()),
    }
  }

  async fn get_feed_item(&self, id: Uuid) -> Result<Option<FeedItem>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFeedItem> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {FEED_ITEM_COLUMNS} FROM feed_items WHERE item_id = ?1"),
            rusqlite::params![id_str],
            raw_feed_item,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawFeedItem::into_feed_item).transpose()
  }

  async fn list_feed_items(&self, owner_id: Option<Uuid>) -> Result<Vec<FeedItem>> {
    let owner_str = owner_id.map(encode_uuid);

    let raws: Vec<RawFeedItem> = self
      .conn
      .call(move |conn| {
        let (filter, params) = match owner_str {
          Some(owner) => ("WHERE owner_id = ?1", vec![owner]),
          None => ("", Vec::new()),
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {FEED_ITEM_COLUMNS} FROM feed_items {filter} ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), raw_feed_item)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedItem::into_feed_item).collect()
  }

  async fn update_feed_item(&self, id: Uuid, status_text: String) -> Result<FeedItem> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFeedItem> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE feed_items SET status_text = ?2 WHERE item_id = ?1",
          rusqlite::params![id_str, status_text],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {FEED_ITEM_COLUMNS} FROM feed_items WHERE item_id = ?1"),
          rusqlite::params![id_str],
          raw_feed_item,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(profiles_core::Error::FeedItemNotFound(id))?
      .into_feed_item()
  }

  async fn delete_feed_item(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM feed_items WHERE item_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(profiles_core::Error::FeedItemNotFound(id).into());
    }
    Ok(())
  }

  // ── Tokens ────────────────────────────────────────────────────────────────

  async fn get_or_insert_token(&self, candidate: AuthToken) -> Result<AuthToken> {
    let key_str     = candidate.key.clone();
    let account_str = encode_uuid(candidate.account_id);
    let at_str      = encode_dt(candidate.created_at);

    let existing: Option<RawToken> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing = tx
          .query_row(
            "SELECT key, account_id, created_at FROM auth_tokens WHERE account_id = ?1",
            rusqlite::params![account_str],
            |row| {
              Ok(RawToken {
                key:        row.get(0)?,
                account_id: row.get(1)?,
                created_at: row.get(2)?,
              })
            },
          )
          .optional()?;
        if existing.is_some() {
          return Ok(existing);
        }

        tx.execute(
          "INSERT INTO auth_tokens (key, account_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![key_str, account_str, at_str],
        )?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match existing {
      Some(raw) => raw.into_token(),
      None => Ok(candidate),
    }
  }

  async fn account_for_token(&self, key: &str) -> Result<Option<Account>> {
    let key = key.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ACCOUNT_COLUMNS} FROM accounts
               WHERE account_id = (SELECT account_id FROM auth_tokens WHERE key = ?1)"
            ),
            rusqlite::params![key],
            raw_account,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}
