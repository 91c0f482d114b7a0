//! Handler for `POST /login`.
//!
//! Exchanges `{"email": "...", "password": "..."}` for the account's opaque
//! token. `username` is accepted as an alias for `email`.

use std::sync::Arc;

use axum::{Json, extract::State};
use profiles_core::{manager, store::ProfileStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  error::ApiError,
  extract,
  validate::{self, FieldErrors, TextRule},
};

#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
  #[serde(alias = "username")]
  pub email:    Option<Value>,
  pub password: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct TokenView {
  pub token: String,
}

/// `POST /login` — returns `{"token": "<key>"}`.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  extract::Json(body): extract::Json<LoginBody>,
) -> Result<Json<TokenView>, ApiError>
where
  S: ProfileStore,
{
  let mut errors = FieldErrors::default();
  let email = validate::required(&mut errors, "email", body.email, TextRule::trimmed(usize::MAX));
  let password =
    validate::required(&mut errors, "password", body.password, TextRule::raw(usize::MAX));
  errors.finish()?;

  let (Some(email), Some(password)) = (email, password) else {
    return Err(ApiError::BadRequest("email and password are required".into()));
  };

  let token = manager::obtain_token(store.as_ref(), &email, &password)
    .await
    .map_err(|e| {
      tracing::info!(error = %e, "login refused");
      ApiError::store(e)
    })?;
  Ok(Json(TokenView { token: token.key }))
}
