//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use profiles_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::validate::FieldErrors;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing, malformed or unknown credentials.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  /// Authenticated, but not the owner of the target record.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("validation failed")]
  Validation(FieldErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure by its domain cause.
  pub fn store<E: StoreError>(e: E) -> Self {
    use profiles_core::Error as Core;

    match e.as_core() {
      Some(Core::Validation { field, message }) => {
        Self::Validation(FieldErrors::single(field, message.clone()))
      }
      Some(Core::DuplicateEmail(_)) => Self::Validation(FieldErrors::single(
        "email",
        "An account with this email already exists.",
      )),
      Some(Core::AccountNotFound(_) | Core::FeedItemNotFound(_)) => {
        Self::NotFound(e.to_string())
      }
      Some(Core::InvalidCredentials) => Self::BadRequest(e.to_string()),
      _ => {
        tracing::error!(error = %e, "store failure");
        Self::Store(Box::new(e))
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    Self::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self::NotFound(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      ApiError::Unauthorized(m) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"profiles\""),
        );
        res
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Forbidden(m) => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
