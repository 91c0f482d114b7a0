//! Handlers for `/profiles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/profiles` | Optional `?search=`; terms match name or email |
//! | `POST`   | `/profiles` | Body: [`AccountBody`] with all fields; returns 201 |
//! | `GET`    | `/profiles/{id}` | 404 if not found |
//! | `PUT`    | `/profiles/{id}` | Owner only; `email` and `name` required |
//! | `PATCH`  | `/profiles/{id}` | Owner only; every field optional |
//! | `DELETE` | `/profiles/{id}` | Owner only; cascades to feed items |
//!
//! Passwords are accepted on write and never returned.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{Method, StatusCode},
  response::IntoResponse,
};
use profiles_core::{
  account::{Account, EMAIL_MAX_LEN, NAME_MAX_LEN, PASSWORD_MAX_LEN},
  manager::{self, AccountChanges},
  permission::Access,
  store::{AccountQuery, ProfileStore},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  auth::{Requester, authorize},
  error::ApiError,
  extract::{self, Path, Query},
  validate::{self, FieldErrors, TextRule},
};

// ─── Payloads ─────────────────────────────────────────────────────────────────

/// Read shape of an account.
#[derive(Debug, Serialize)]
pub struct AccountView {
  pub id:    Uuid,
  pub email: String,
  pub name:  String,
}

impl From<Account> for AccountView {
  fn from(a: Account) -> Self {
    AccountView { id: a.account_id, email: a.email, name: a.name }
  }
}

/// Write shape of an account. Which fields are required depends on the
/// method; see [`AccountBody::into_new`] and [`AccountBody::into_changes`].
#[derive(Debug, Default, Deserialize)]
pub struct AccountBody {
  pub email:    Option<Value>,
  pub name:     Option<Value>,
  pub password: Option<Value>,
}

const EMAIL: TextRule = TextRule::trimmed(EMAIL_MAX_LEN);
const NAME: TextRule = TextRule::trimmed(NAME_MAX_LEN);
const PASSWORD: TextRule = TextRule::raw(PASSWORD_MAX_LEN);

/// A validated creation payload.
pub struct NewAccountInput {
  pub email:    String,
  pub name:     String,
  pub password: String,
}

impl AccountBody {
  /// Validate for `POST`: every field is required.
  pub fn into_new(self) -> Result<NewAccountInput, ApiError> {
    let mut errors = FieldErrors::default();
    let email = validate::required(&mut errors, "email", self.email, EMAIL);
    let email = validate::email(&mut errors, email);
    let name = validate::required(&mut errors, "name", self.name, NAME);
    let password = validate::required(&mut errors, "password", self.password, PASSWORD);
    errors.finish()?;

    match (email, name, password) {
      (Some(email), Some(name), Some(password)) => {
        Ok(NewAccountInput { email, name, password })
      }
      _ => Err(ApiError::BadRequest("incomplete account payload".into())),
    }
  }

  /// Validate for `PUT` (`partial == false`: email and name required) or
  /// `PATCH` (`partial == true`: nothing required). The password is always
  /// optional on update.
  pub fn into_changes(self, partial: bool) -> Result<AccountChanges, ApiError> {
    let mut errors = FieldErrors::default();
    let text = if partial { validate::optional } else { validate::required };

    let email = text(&mut errors, "email", self.email, EMAIL);
    let email = validate::email(&mut errors, email);
    let name = text(&mut errors, "name", self.name, NAME);
    let password = validate::optional(&mut errors, "password", self.password, PASSWORD);
    errors.finish()?;

    Ok(AccountChanges { email, name, password })
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search: Option<String>,
}

/// `GET /profiles[?search=<terms>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _requester: Requester,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AccountView>>, ApiError>
where
  S: ProfileStore,
{
  let accounts = store
    .list_accounts(&AccountQuery { search: params.search })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(accounts.into_iter().map(AccountView::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /profiles` — returns 201 + the created account.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  _requester: Requester,
  extract::Json(body): extract::Json<AccountBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProfileStore,
{
  let input = body.into_new()?;
  let account = manager::create_account(
    store.as_ref(),
    &input.email,
    &input.name,
    Some(&input.password),
  )
  .await
  .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(AccountView::from(account))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn load<S: ProfileStore>(store: &S, id: Uuid) -> Result<Account, ApiError> {
  store
    .get_account(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))
}

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Requester(requester): Requester,
  method: Method,
) -> Result<Json<AccountView>, ApiError>
where
  S: ProfileStore,
{
  let account = load(store.as_ref(), id).await?;
  authorize(requester.as_ref(), &account, Access::from_method(method.as_str()))?;
  Ok(Json(AccountView::from(account)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

async fn apply_update<S: ProfileStore>(
  store:     &S,
  id:        Uuid,
  requester: Option<Account>,
  method:    &Method,
  body:      AccountBody,
  partial:   bool,
) -> Result<Json<AccountView>, ApiError> {
  let account = load(store, id).await?;
  authorize(requester.as_ref(), &account, Access::from_method(method.as_str()))?;

  let changes = body.into_changes(partial)?;
  let updated = manager::update_account(store, account.account_id, changes)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account_id = %updated.account_id, "updated profile");
  Ok(Json(AccountView::from(updated)))
}

/// `PUT /profiles/{id}` — owner only.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Requester(requester): Requester,
  method: Method,
  extract::Json(body): extract::Json<AccountBody>,
) -> Result<Json<AccountView>, ApiError>
where
  S: ProfileStore,
{
  apply_update(store.as_ref(), id, requester, &method, body, false).await
}

/// `PATCH /profiles/{id}` — owner only.
pub async fn partial_update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Requester(requester): Requester,
  method: Method,
  extract::Json(body): extract::Json<AccountBody>,
) -> Result<Json<AccountView>, ApiError>
where
  S: ProfileStore,
{
  apply_update(store.as_ref(), id, requester, &method, body, true).await
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /profiles/{id}` — owner only; returns 204.
pub async fn destroy<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Requester(requester): Requester,
  method: Method,
) -> Result<StatusCode, ApiError>
where
  S: ProfileStore,
{
  let account = load(store.as_ref(), id).await?;
  authorize(requester.as_ref(), &account, Access::from_method(method.as_str()))?;

  store
    .delete_account(account.account_id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account_id = %account.account_id, "deleted profile");
  Ok(StatusCode::NO_CONTENT)
}
