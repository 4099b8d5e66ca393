//! Shared domain types for Strongroom.
//!
//! This crate contains the contracts shared by every layer: the data model
//! trait, model source descriptions, the database kind, configuration and the
//! error taxonomy, plus the credential model.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod credential;
pub mod database;
pub mod error;
pub mod model;
pub mod source;
