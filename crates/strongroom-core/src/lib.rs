//! Persistence ports for Strongroom.
//!
//! This crate defines the "ports" that the infrastructure layer implements
//! (the `Repository` and `TextCipher` traits) together with the logic that
//! only needs those ports: field policies and the field-encrypting repository
//! decorator. It depends only on `strongroom-types` -- never on
//! `strongroom-infra` or any database/crypto crate.

pub mod cipher;
pub mod policy;
pub mod repository;
