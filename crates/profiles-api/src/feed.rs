//! Handlers for `/feed` endpoints. Every route requires authentication.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/feed` | Optional `?user_profile=<id>` owner filter |
//! | `POST`   | `/feed` | Body: `{"status_text": "..."}`; owner is the requester |
//! | `GET`    | `/feed/{id}` | 404 if not found |
//! | `PUT`    | `/feed/{id}` | Owner only; `status_text` required |
//! | `PATCH`  | `/feed/{id}` | Owner only; `status_text` optional |
//! | `DELETE` | `/feed/{id}` | Owner only |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{Method, StatusCode},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use profiles_core::{
  feed::{FeedItem, NewFeedItem, STATUS_TEXT_MAX_LEN},
  permission::Access,
  store::ProfileStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  auth::{Authenticated, authorize},
  error::ApiError,
  extract::{self, Path, Query},
  validate::{self, FieldErrors, TextRule},
};

// ─── Payloads ─────────────────────────────────────────────────────────────────

/// Read shape of a feed item.
#[derive(Debug, Serialize)]
pub struct FeedItemView {
  pub id:           Uuid,
  pub user_profile: Uuid,
  pub status_text:  String,
  pub created_on:   DateTime<Utc>,
}

impl From<FeedItem> for FeedItemView {
  fn from(i: FeedItem) -> Self {
    FeedItemView {
      id:           i.item_id,
      user_profile: i.owner_id,
      status_text:  i.status_text,
      created_on:   i.created_on,
    }
  }
}

/// Write shape of a feed item. Any owner field a client sends is dropped
/// during deserialisation.
#[derive(Debug, Default, Deserialize)]
pub struct FeedItemBody {
  pub status_text: Option<Value>,
}

const STATUS_TEXT: TextRule = TextRule::trimmed(STATUS_TEXT_MAX_LEN);

impl FeedItemBody {
  /// Validated status text; `None` only when `partial` and absent.
  pub fn into_status_text(self, partial: bool) -> Result<Option<String>, ApiError> {
    let mut errors = FieldErrors::default();
    let text = if partial {
      validate::optional(&mut errors, "status_text", self.status_text, STATUS_TEXT)
    } else {
      validate::required(&mut errors, "status_text", self.status_text, STATUS_TEXT)
    };
    errors.finish()?;
    Ok(text)
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_profile: Option<Uuid>,
}

/// `GET /feed[?user_profile=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<FeedItemView>>, ApiError>
where
  S: ProfileStore,
{
  let items = store
    .list_feed_items(params.user_profile)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items.into_iter().map(FeedItemView::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /feed` — the owner is always the authenticated requester.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Authenticated(account): Authenticated,
  extract::Json(body): extract::Json<FeedItemBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProfileStore,
{
  let status_text = body
    .into_status_text(false)?
    .ok_or_else(|| ApiError::BadRequest("status_text is required".into()))?;

  let item = store
    .insert_feed_item(NewFeedItem { owner_id: account.account_id, status_text })
    .await
    .map_err(ApiError::store)?;

  tracing::debug!(item_id = %item.item_id, owner = %item.owner_id, "posted feed item");
  Ok((StatusCode::CREATED, Json(FeedItemView::from(item))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn load<S: ProfileStore>(store: &S, id: Uuid) -> Result<FeedItem, ApiError> {
  store
    .get_feed_item(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("feed item {id} not found")))
}

/// `GET /feed/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Authenticated(account): Authenticated,
  method: Method,
) -> Result<Json<FeedItemView>, ApiError>
where
  S: ProfileStore,
{
  let item = load(store.as_ref(), id).await?;
  authorize(Some(&account), &item, Access::from_method(method.as_str()))?;
  Ok(Json(FeedItemView::from(item)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

async fn apply_update<S: ProfileStore>(
  store:   &S,
  id:      Uuid,
  account: &profiles_core::account::Account,
  method:  &Method,
  body:    FeedItemBody,
  partial: bool,
) -> Result<Json<FeedItemView>, ApiError> {
  let item = load(store, id).await?;
  authorize(Some(account), &item, Access::from_method(method.as_str()))?;

  let updated = match body.into_status_text(partial)? {
    Some(text) => store
      .update_feed_item(item.item_id, text)
      .await
      .map_err(ApiError::store)?,
    None => item,
  };
  Ok(Json(FeedItemView::from(updated)))
}

/// `PUT /feed/{id}` — owner only.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Authenticated(account): Authenticated,
  method: Method,
  extract::Json(body): extract::Json<FeedItemBody>,
) -> Result<Json<FeedItemView>, ApiError>
where
  S: ProfileStore,
{
  apply_update(store.as_ref(), id, &account, &method, body, false).await
}

/// `PATCH /feed/{id}` — owner only.
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Authenticated(account): Authenticated,
  method: Method,
  extract::Json(body): extract::Json<FeedItemBody>,
) -> Result<Json<FeedItemView>, ApiError>
where
  S: ProfileStore,
{
  apply_update(store.as_ref(), id, &account, &method, body, true).await
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /feed/{id}` — owner only; returns 204.
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Authenticated(account): Authenticated,
  method: Method,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore,
{
  let item = load(store.as_ref(), id).await?;
  authorize(Some(&account), &item, Access::from_method(method.as_str()))?;

  store
    .delete_feed_item(item.item_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
