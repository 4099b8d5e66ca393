//! Infrastructure layer for Strongroom.
//!
//! Contains implementations of the ports defined in `strongroom-core`:
//! the sqlx-backed session factory provider and SQL repository, entity
//! mappings, the AES-256-GCM text cipher, and the configuration loader.
//!
//! Session factories spawn pool maintenance tasks. Outside a Tokio runtime,
//! registering a source returns a store error instead of building a factory.

pub mod config;
pub mod crypto;
pub mod session;
pub mod sql;
