//! Core types and trait definitions for the profiles service.
//!
//! Holds accounts, feed items, tokens, and the rules around them. Nothing here
//! knows about HTTP or SQL; backends implement [`store::ProfileStore`].

// Store futures spell out their `Send` bounds in the trait.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod error;
pub mod feed;
pub mod manager;
pub mod password;
pub mod permission;
pub mod store;
pub mod token;

pub use error::{Error, Result};
