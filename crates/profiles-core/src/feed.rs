//! Feed items — short status posts owned by exactly one account.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum length of a status update, in characters.
pub const STATUS_TEXT_MAX_LEN: usize = 255;

/// A persisted status post. `created_on` is assigned by the store and never
/// changes afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
  pub item_id:     Uuid,
  pub owner_id:    Uuid,
  pub status_text: String,
  pub created_on:  DateTime<Utc>,
}

impl fmt::Display for FeedItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.status_text)
  }
}

/// Input for [`ProfileStore::insert_feed_item`](crate::store::ProfileStore::insert_feed_item).
///
/// `owner_id` always comes from the authenticated requester, never from a
/// client payload.
#[derive(Debug, Clone)]
pub struct NewFeedItem {
  pub owner_id:    Uuid,
  pub status_text: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serializes_with_owner_and_timestamp() {
    let item = FeedItem {
      item_id:     Uuid::nil(),
      owner_id:    Uuid::nil(),
      status_text: "hello".into(),
      created_on:  Utc::now(),
    };
    let json = serde_json::to_value(&item).unwrap();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 4);
    for key in ["item_id", "owner_id", "status_text", "created_on"] {
      assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(item.to_string(), "hello");
  }
}
