//! Ownership authorization.
//!
//! Authorization is pure identity equality: reads are open to everyone with
//! read access, mutations only to the record's owner. There are no roles.

use uuid::Uuid;

use crate::{account::Account, feed::FeedItem};

/// The kind of action a requester is attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// Safe, read-only methods (GET, HEAD, OPTIONS).
  Read,
  /// Anything that creates, changes or deletes state.
  Mutate,
}

impl Access {
  /// Map an HTTP method name onto an access kind.
  pub fn from_method(method: &str) -> Self {
    match method {
      "GET" | "HEAD" | "OPTIONS" => Self::Read,
      _ => Self::Mutate,
    }
  }
}

/// May `requester_id` act on the account `target_account_id`?
pub fn can_modify_account(
  requester_id:      Uuid,
  target_account_id: Uuid,
  access:            Access,
) -> bool {
  match access {
    Access::Read => true,
    Access::Mutate => requester_id == target_account_id,
  }
}

/// May `requester_id` act on a feed item owned by `feed_item_owner_id`?
pub fn can_modify_feed_item(
  requester_id:       Uuid,
  feed_item_owner_id: Uuid,
  access:             Access,
) -> bool {
  match access {
    Access::Read => true,
    Access::Mutate => requester_id == feed_item_owner_id,
  }
}

/// A record whose mutation is restricted to a single owning account.
pub trait Owned {
  /// The account allowed to mutate this record.
  fn owner_id(&self) -> Uuid;

  /// Whether `requester_id` may perform `access` on this record.
  fn permits(&self, requester_id: Uuid, access: Access) -> bool;
}

impl Owned for Account {
  fn owner_id(&self) -> Uuid { self.account_id }

  fn permits(&self, requester_id: Uuid, access: Access) -> bool {
    can_modify_account(requester_id, self.account_id, access)
  }
}

impl Owned for FeedItem {
  fn owner_id(&self) -> Uuid { self.owner_id }

  fn permits(&self, requester_id: Uuid, access: Access) -> bool {
    can_modify_feed_item(requester_id, self.owner_id, access)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn owner_may_mutate_own_account() {
    let a = Uuid::new_v4();
    assert!(can_modify_account(a, a, Access::Mutate));
  }

  #[test]
  fn stranger_may_not_mutate_account() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(!can_modify_account(a, b, Access::Mutate));
  }

  #[test]
  fn anyone_may_read() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(can_modify_account(a, b, Access::Read));
    assert!(can_modify_feed_item(a, b, Access::Read));
  }

  #[test]
  fn feed_item_rule_compares_owner() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(can_modify_feed_item(a, a, Access::Mutate));
    assert!(!can_modify_feed_item(a, b, Access::Mutate));
  }

  #[test]
  fn method_mapping() {
    for safe in ["GET", "HEAD", "OPTIONS"] {
      assert_eq!(Access::from_method(safe), Access::Read);
    }
    for unsafe_method in ["POST", "PUT", "PATCH", "DELETE"] {
      assert_eq!(Access::from_method(unsafe_method), Access::Mutate);
    }
  }

  #[test]
  fn owned_feed_item_dispatches_on_owner_not_item_id() {
    let owner = Uuid::new_v4();
    let item = FeedItem {
      item_id:     Uuid::new_v4(),
      owner_id:    owner,
      status_text: "hello".into(),
      created_on:  Utc::now(),
    };
    assert_eq!(item.owner_id(), owner);
    assert!(item.permits(owner, Access::Mutate));
    assert!(!item.permits(item.item_id, Access::Mutate));
  }
}
