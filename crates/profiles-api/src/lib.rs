//! JSON REST API for profiles and their status feed.
//!
//! Exposes an axum [`Router`] backed by any [`ProfileStore`]. Token
//! authentication and ownership checks happen inside the handlers; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = profiles_api::api_router(Arc::new(store));
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod feed;
pub mod login;
pub mod profiles;
pub mod validate;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use profiles_core::store::ProfileStore;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PROFILES_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("profiles.sqlite3") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProfileStore + 'static,
{
  Router::new()
    // Profiles
    .route("/profiles", get(profiles::list::<S>).post(profiles::create::<S>))
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S>)
        .put(profiles::update::<S>)
        .patch(profiles::partial_update::<S>)
        .delete(profiles::destroy::<S>),
    )
    // Login
    .route("/login", post(login::handler::<S>))
    // Feed
    .route("/feed", get(feed::list::<S>).post(feed::create::<S>))
    .route(
      "/feed/{id}",
      get(feed::get_one::<S>)
        .put(feed::update::<S>)
        .patch(feed::partial_update::<S>)
        .delete(feed::destroy::<S>),
    )
    .with_state(store)
}
