//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans use SQLite's integer affinity.

use chrono::{DateTime, Utc};
use profiles_core::{account::Account, feed::FeedItem, token::AuthToken};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LIKE patterns ────────────────────────────────────────────────────────────

/// Wrap `term` in `%…%`, escaping LIKE wildcards with `\`.
pub fn contains_pattern(term: &str) -> String {
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for c in term.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, name, password_hash, is_active, is_staff, is_superuser, created_at";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub is_superuser:  bool,
  pub created_at:    String,
}

/// Row mapper for queries selecting [`ACCOUNT_COLUMNS`] in order.
pub fn raw_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccount> {
  Ok(RawAccount {
    account_id:    row.get(0)?,
    email:         row.get(1)?,
    name:          row.get(2)?,
    password_hash: row.get(3)?,
    is_active:     row.get(4)?,
    is_staff:      row.get(5)?,
    is_superuser:  row.get(6)?,
    created_at:    row.get(7)?,
  })
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      email:         self.email,
      name:          self.name,
      password_hash: self.password_hash,
      is_active:     self.is_active,
      is_staff:      self.is_staff,
      is_superuser:  self.is_superuser,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const FEED_ITEM_COLUMNS: &str = "item_id, owner_id, status_text, created_on";

/// Raw values read directly from a `feed_items` row.
pub struct RawFeedItem {
  pub item_id:     String,
  pub owner_id:    String,
  pub status_text: String,
  pub created_on:  String,
}

/// Row mapper for queries selecting [`FEED_ITEM_COLUMNS`] in order.
pub fn raw_feed_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFeedItem> {
  Ok(RawFeedItem {
    item_id:     row.get(0)?,
    owner_id:    row.get(1)?,
    status_text: row.get(2)?,
    created_on:  row.get(3)?,
  })
}

impl RawFeedItem {
  pub fn into_feed_item(self) -> Result<FeedItem> {
    Ok(FeedItem {
      item_id:     decode_uuid(&self.item_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      status_text: self.status_text,
      created_on:  decode_dt(&self.created_on)?,
    })
  }
}

/// Raw values read directly from an `auth_tokens` row.
pub struct RawToken {
  pub key:        String,
  pub account_id: String,
  pub created_at: String,
}

impl RawToken {
  pub fn into_token(self) -> Result<AuthToken> {
    Ok(AuthToken {
      key:        self.key,
      account_id: decode_uuid(&self.account_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
