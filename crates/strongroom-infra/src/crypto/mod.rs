//! Cryptographic operations for Strongroom.
//!
//! - `cipher`: AES-256-GCM text encryption keyed by Argon2id-derived keys

pub mod cipher;
