//! SQL storage layer.
//!
//! A generic repository over sqlx's runtime-selected `Any` driver, with
//! dialect-specific statement generation and per-entity column mappings.

pub mod credential;
pub mod dialect;
pub mod mapping;
pub mod repository;
pub mod statements;

pub use dialect::Dialect;
pub use mapping::{EntityMapping, FieldValue};
pub use repository::SqlRepository;
