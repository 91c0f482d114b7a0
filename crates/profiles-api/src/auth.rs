//! Bearer-token extractors and the ownership check used by handlers.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use profiles_core::{
  account::Account,
  permission::{Access, Owned},
  store::ProfileStore,
};

use crate::error::ApiError;

/// Pull the token key out of an `Authorization: Bearer <key>` header.
///
/// `Token <key>` is accepted as well. No header, or a header for some other
/// scheme, is anonymous (`Ok(None)`); a bearer header without a usable key is
/// an error.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| ApiError::Unauthorized("invalid token header".into()))?;

  let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
  if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
    return Ok(None);
  }

  let key = rest.trim();
  if key.is_empty() {
    return Err(ApiError::Unauthorized(
      "invalid token header: no credentials provided".into(),
    ));
  }
  if key.contains(char::is_whitespace) {
    return Err(ApiError::Unauthorized(
      "invalid token header: token string should not contain spaces".into(),
    ));
  }
  Ok(Some(key.to_owned()))
}

/// The account behind the request's token, or `None` for anonymous requests.
pub struct Requester(pub Option<Account>);

/// Like [`Requester`], but rejects anonymous requests with 401.
pub struct Authenticated(pub Account);

impl<S> FromRequestParts<Arc<S>> for Requester
where
  S: ProfileStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(key) = token_from_headers(&parts.headers)? else {
      return Ok(Requester(None));
    };

    let account = store
      .account_for_token(&key)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized("invalid token".into()))?;

    if !account.is_active {
      tracing::warn!(account_id = %account.account_id, "token used by inactive account");
      return Err(ApiError::Unauthorized("account inactive or deleted".into()));
    }

    Ok(Requester(Some(account)))
  }
}

impl<S> FromRequestParts<Arc<S>> for Authenticated
where
  S: ProfileStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    match Requester::from_request_parts(parts, store).await? {
      Requester(Some(account)) => Ok(Authenticated(account)),
      Requester(None) => Err(not_authenticated()),
    }
  }
}

fn not_authenticated() -> ApiError {
  ApiError::Unauthorized("authentication credentials were not provided".into())
}

/// Check that `requester` may perform `access` on `target`.
///
/// Reads are always allowed. Mutations need an authenticated owner: anonymous
/// callers get 401, everyone else 403.
pub fn authorize<T: Owned>(
  requester: Option<&Account>,
  target:    &T,
  access:    Access,
) -> Result<(), ApiError> {
  if access == Access::Read {
    return Ok(());
  }
  let Some(account) = requester else {
    return Err(not_authenticated());
  };
  if target.permits(account.account_id, access) {
    Ok(())
  } else {
    tracing::debug!(
      requester = %account.account_id,
      owner = %target.owner_id(),
      "mutation denied to non-owner"
    );
    Err(ApiError::Forbidden(
      "you do not have permission to perform this action".into(),
    ))
  }
}
