//! Integration tests for `SqliteStore` against an in-memory database.

use profiles_core::{
  account::{AccountPatch, NewAccount},
  feed::NewFeedItem,
  manager::{self, AccountChanges},
  password::{is_usable, verify_password},
  store::{AccountQuery, ProfileStore, StoreError as _},
  token::AuthToken,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_account(email: &str, name: &str) -> NewAccount {
  NewAccount {
    email:         email.into(),
    name:          name.into(),
    password_hash: "!unusable".into(),
    is_staff:      false,
    is_superuser:  false,
  }
}

fn is_duplicate(e: &Error) -> bool {
  matches!(e.as_core(), Some(profiles_core::Error::DuplicateEmail(_)))
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_account() {
  let s = store().await;

  let account = s.insert_account(new_account("a@x.com", "Alice")).await.unwrap();
  assert!(account.is_active);
  assert!(!account.is_staff);

  let fetched = s.get_account(account.account_id).await.unwrap().unwrap();
  assert_eq!(fetched.account_id, account.account_id);
  assert_eq!(fetched.email, "a@x.com");
  assert_eq!(fetched.name, "Alice");
  assert_eq!(fetched.created_at, account.created_at);
}

#[tokio::test]
async fn get_account_missing_returns_none() {
  let s = store().await;
  assert!(s.get_account(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let s = store().await;
  s.insert_account(new_account("bob@x.com", "Bob")).await.unwrap();

  let err = s
    .insert_account(new_account("BOB@x.com", "Other Bob"))
    .await
    .unwrap_err();
  assert!(is_duplicate(&err), "unexpected error: {err}");

  let all = s.list_accounts(&AccountQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn find_by_email_ignores_case() {
  let s = store().await;
  let account = s.insert_account(new_account("carol@x.com", "Carol")).await.unwrap();

  let found = s.find_account_by_email("Carol@X.com").await.unwrap().unwrap();
  assert_eq!(found.account_id, account.account_id);
  assert!(s.find_account_by_email("nobody@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn list_accounts_in_creation_order() {
  let s = store().await;
  for (email, name) in [("1@x.com", "One"), ("2@x.com", "Two"), ("3@x.com", "Three")] {
    s.insert_account(new_account(email, name)).await.unwrap();
  }

  let names: Vec<String> = s
    .list_accounts(&AccountQuery::default())
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.name)
    .collect();
  assert_eq!(names, ["One", "Two", "Three"]);
}

#[tokio::test]
async fn search_matches_name_or_email() {
  let s = store().await;
  s.insert_account(new_account("alice@wonder.land", "Alice Liddell")).await.unwrap();
  s.insert_account(new_account("hatter@wonder.land", "Mad Hatter")).await.unwrap();
  s.insert_account(new_account("bob@builder.io", "Bob")).await.unwrap();

  let search = |text: &str| AccountQuery { search: Some(text.into()) };

  let hits = s.list_accounts(&search("WONDER")).await.unwrap();
  assert_eq!(hits.len(), 2);

  let hits = s.list_accounts(&search("hatter")).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Mad Hatter");

  // Every term must match.
  let hits = s.list_accounts(&search("alice, wonder")).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert!(s.list_accounts(&search("alice bob")).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let s = store().await;
  s.insert_account(new_account("plain@x.com", "Plain")).await.unwrap();

  let query = AccountQuery { search: Some("%".into()) };
  assert!(s.list_accounts(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_account_applies_only_present_fields() {
  let s = store().await;
  let account = s.insert_account(new_account("dan@x.com", "Dan")).await.unwrap();

  let updated = s
    .update_account(account.account_id, AccountPatch {
      name: Some("Daniel".into()),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.name, "Daniel");
  assert_eq!(updated.email, "dan@x.com");
  assert_eq!(updated.password_hash, account.password_hash);
}

#[tokio::test]
async fn update_account_rejects_taken_email() {
  let s = store().await;
  s.insert_account(new_account("erin@x.com", "Erin")).await.unwrap();
  let frank = s.insert_account(new_account("frank@x.com", "Frank")).await.unwrap();

  let err = s
    .update_account(frank.account_id, AccountPatch {
      email: Some("ERIN@x.com".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(is_duplicate(&err));

  // Re-saving one's own email is fine.
  s.update_account(frank.account_id, AccountPatch {
    email: Some("frank@x.com".into()),
    ..Default::default()
  })
  .await
  .unwrap();
}

#[tokio::test]
async fn update_missing_account_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .update_account(id, AccountPatch { is_staff: Some(true), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::AccountNotFound(x)) if *x == id));
}

#[tokio::test]
async fn deleting_account_cascades_to_feed_items_and_token() {
  let s = store().await;
  let account = s.insert_account(new_account("gina@x.com", "Gina")).await.unwrap();
  let item = s
    .insert_feed_item(NewFeedItem {
      owner_id:    account.account_id,
      status_text: "hello".into(),
    })
    .await
    .unwrap();
  let token = s
    .get_or_insert_token(AuthToken::generate(account.account_id))
    .await
    .unwrap();

  s.delete_account(account.account_id).await.unwrap();

  assert!(s.get_account(account.account_id).await.unwrap().is_none());
  assert!(s.get_feed_item(item.item_id).await.unwrap().is_none());
  assert!(s.account_for_token(&token.key).await.unwrap().is_none());

  let err = s.delete_account(account.account_id).await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::AccountNotFound(_))));
}

// ─── Feed items ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_item_crud() {
  let s = store().await;
  let owner = s.insert_account(new_account("hal@x.com", "Hal")).await.unwrap();

  let item = s
    .insert_feed_item(NewFeedItem {
      owner_id:    owner.account_id,
      status_text: "first post".into(),
    })
    .await
    .unwrap();
  assert_eq!(item.owner_id, owner.account_id);

  let updated = s
    .update_feed_item(item.item_id, "edited".into())
    .await
    .unwrap();
  assert_eq!(updated.status_text, "edited");
  assert_eq!(updated.owner_id, owner.account_id);
  assert_eq!(updated.created_on, item.created_on);

  s.delete_feed_item(item.item_id).await.unwrap();
  assert!(s.get_feed_item(item.item_id).await.unwrap().is_none());

  let err = s.delete_feed_item(item.item_id).await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::FeedItemNotFound(_))));
}

#[tokio::test]
async fn feed_item_requires_existing_owner() {
  let s = store().await;
  let ghost = Uuid::new_v4();
  let err = s
    .insert_feed_item(NewFeedItem { owner_id: ghost, status_text: "boo".into() })
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::AccountNotFound(x)) if *x == ghost));
}

#[tokio::test]
async fn list_feed_items_filters_by_owner() {
  let s = store().await;
  let a = s.insert_account(new_account("ivy@x.com", "Ivy")).await.unwrap();
  let b = s.insert_account(new_account("jon@x.com", "Jon")).await.unwrap();

  for (owner, text) in [(&a, "a1"), (&b, "b1"), (&a, "a2")] {
    s.insert_feed_item(NewFeedItem {
      owner_id:    owner.account_id,
      status_text: text.into(),
    })
    .await
    .unwrap();
  }

  let all = s.list_feed_items(None).await.unwrap();
  let texts: Vec<&str> = all.iter().map(|i| i.status_text.as_str()).collect();
  assert_eq!(texts, ["a1", "b1", "a2"]);

  let mine = s.list_feed_items(Some(a.account_id)).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|i| i.owner_id == a.account_id));
}

#[tokio::test]
async fn update_missing_feed_item_is_not_found() {
  let s = store().await;
  let err = s.update_feed_item(Uuid::new_v4(), "x".into()).await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::FeedItemNotFound(_))));
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_is_created_once_per_account() {
  let s = store().await;
  let account = s.insert_account(new_account("kim@x.com", "Kim")).await.unwrap();

  let first = s
    .get_or_insert_token(AuthToken::generate(account.account_id))
    .await
    .unwrap();
  let second = s
    .get_or_insert_token(AuthToken::generate(account.account_id))
    .await
    .unwrap();
  assert_eq!(first.key, second.key);

  let owner = s.account_for_token(&first.key).await.unwrap().unwrap();
  assert_eq!(owner.account_id, account.account_id);
  assert!(s.account_for_token("not-a-token").await.unwrap().is_none());
}

// ─── Account manager ─────────────────────────────────────────────────────────

#[tokio::test]
async fn regular_account_has_no_privileges_and_hashed_password() {
  let s = store().await;
  let account = manager::create_account(&s, "a@X.COM", "Alice", Some("pw1"))
    .await
    .unwrap();

  assert_eq!(account.email, "a@x.com");
  assert!(!account.is_staff);
  assert!(!account.is_superuser);
  assert_ne!(account.password_hash, "pw1");
  assert!(verify_password("pw1", &account.password_hash));
}

#[tokio::test]
async fn privileged_account_is_staff_and_superuser() {
  let s = store().await;
  let account = manager::create_privileged_account(&s, "root@x.com", "Root", "pw")
    .await
    .unwrap();
  assert!(account.is_staff);
  assert!(account.is_superuser);

  let stored = s.get_account(account.account_id).await.unwrap().unwrap();
  assert!(stored.is_staff && stored.is_superuser);
}

#[tokio::test]
async fn empty_email_is_a_validation_error() {
  let s = store().await;
  let err = manager::create_account(&s, "", "Nobody", Some("pw"))
    .await
    .unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(profiles_core::Error::Validation { field: "email", .. })
  ));
  assert!(s.list_accounts(&AccountQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn account_without_password_cannot_log_in() {
  let s = store().await;
  let account = manager::create_account(&s, "nopw@x.com", "No Password", None)
    .await
    .unwrap();
  assert!(!is_usable(&account.password_hash));

  let err = manager::obtain_token(&s, "nopw@x.com", "").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::InvalidCredentials)));
}

#[tokio::test]
async fn update_without_password_keeps_hash() {
  let s = store().await;
  let account = manager::create_account(&s, "lee@x.com", "Lee", Some("old"))
    .await
    .unwrap();

  let updated = manager::update_account(&s, account.account_id, AccountChanges {
    name: Some("Leigh".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  assert_eq!(updated.name, "Leigh");
  assert_eq!(updated.password_hash, account.password_hash);
}

#[tokio::test]
async fn update_with_password_rehashes() {
  let s = store().await;
  let account = manager::create_account(&s, "max@x.com", "Max", Some("old"))
    .await
    .unwrap();

  let updated = manager::update_account(&s, account.account_id, AccountChanges {
    password: Some("new".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  assert_ne!(updated.password_hash, account.password_hash);
  assert!(verify_password("new", &updated.password_hash));
  assert!(!verify_password("old", &updated.password_hash));
}

#[tokio::test]
async fn update_normalizes_email() {
  let s = store().await;
  let account = manager::create_account(&s, "ned@x.com", "Ned", Some("pw"))
    .await
    .unwrap();

  let updated = manager::update_account(&s, account.account_id, AccountChanges {
    email: Some("Ned@NEW.example".into()),
    ..Default::default()
  })
  .await
  .unwrap();
  assert_eq!(updated.email, "Ned@new.example");
}

#[tokio::test]
async fn empty_update_returns_current_account() {
  let s = store().await;
  let account = manager::create_account(&s, "oz@x.com", "Oz", Some("pw"))
    .await
    .unwrap();

  let same = manager::update_account(&s, account.account_id, AccountChanges::default())
    .await
    .unwrap();
  assert_eq!(same.name, "Oz");

  let err = manager::update_account(&s, Uuid::new_v4(), AccountChanges::default())
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::AccountNotFound(_))));
}

#[tokio::test]
async fn login_issues_stable_token() {
  let s = store().await;
  let account = manager::create_account(&s, "pat@x.com", "Pat", Some("secret"))
    .await
    .unwrap();

  let first = manager::obtain_token(&s, "pat@X.com", "secret").await.unwrap();
  let second = manager::obtain_token(&s, "pat@x.com", "secret").await.unwrap();
  assert_eq!(first.key, second.key);
  assert_eq!(first.account_id, account.account_id);
}

#[tokio::test]
async fn login_rejects_bad_password_and_inactive_accounts() {
  let s = store().await;
  let account = manager::create_account(&s, "quinn@x.com", "Quinn", Some("secret"))
    .await
    .unwrap();

  let err = manager::obtain_token(&s, "quinn@x.com", "wrong").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::InvalidCredentials)));

  let err = manager::obtain_token(&s, "nobody@x.com", "secret").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::InvalidCredentials)));

  s.update_account(account.account_id, AccountPatch {
    is_active: Some(false),
    ..Default::default()
  })
  .await
  .unwrap();
  let err = manager::obtain_token(&s, "quinn@x.com", "secret").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(profiles_core::Error::InvalidCredentials)));
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_email_login_hashes_off_the_runtime_thread() {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  let s = store().await;
  let ticks = Arc::new(AtomicUsize::new(0));
  let ticker = {
    let ticks = ticks.clone();
    tokio::spawn(async move {
      loop {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        ticks.fetch_add(1, Ordering::Relaxed);
      }
    })
  };

  // The miss path still runs a full argon2 verification, and the single
  // runtime thread stays free to drive the ticker meanwhile.
  let err = manager::obtain_token(&s, "ghost@x.com", "secret").await.unwrap_err();
  ticker.abort();

  assert!(matches!(err.as_core(), Some(profiles_core::Error::InvalidCredentials)));
  assert!(ticks.load(Ordering::Relaxed) >= 3, "runtime thread was blocked");
}
