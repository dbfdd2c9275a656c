//! # verdant-store
//!
//! Local device persistence for the Verdant storefront client.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides a small key/value surface: one JSON or
//! plain-text value per namespaced key, each tagged with the schema version
//! that wrote it. The cart, the mirrored user profile and the bearer
//! credential all live here and survive application restarts.

pub mod database;
pub mod kv;
pub mod migrations;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use kv::VALUE_SCHEMA_VERSION;
